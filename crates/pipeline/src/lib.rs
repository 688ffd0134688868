//! Drives the whole per-user grid run: for every game and enabled art
//! style, recover or resolve a clean image, decorate it, back it up and
//! write the result into the grid directory. Units run on a bounded
//! worker pool and individual failures never abort the run.

pub mod report;
pub mod run;

pub use report::{Report, Unit};
pub use run::{run_user, RunConfig};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Steam(#[from] overgrid_steam::SteamError),
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e.to_string())
    }
}
