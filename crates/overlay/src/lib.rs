//! Category overlay compositing.
//!
//! Overlays are small decorations drawn over grid artwork based on the
//! game's categories ("favorites", "rpg", ...). Static images get a
//! single composite pass; animated WEBP and APNG artwork is decorated
//! frame by frame with timing preserved, optionally transcoding WEBP to
//! APNG for Steam builds that can't play animated WEBP.

pub mod compositor;
pub mod container;
pub mod loader;

pub use compositor::{decorate, CompositorConfig};
pub use loader::{load_overlays, OverlaySet};

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),
}

impl From<std::io::Error> for OverlayError {
    fn from(e: std::io::Error) -> Self {
        OverlayError::Io(e.to_string())
    }
}
