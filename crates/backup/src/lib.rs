//! Preserves the clean (pre-overlay) artwork for every decorated image.
//!
//! The canonical grid file always holds the decorated result, so the
//! clean original is kept next to it under `originals/`, addressed by
//! the SHA-256 of the decorated bytes. On the next run the decorated
//! file's hash leads straight back to its clean source, making repeated
//! runs idempotent. User files in the override directory and manual
//! customizations in the grid directory are recognized and never
//! clobbered without a backup.

pub mod state;
pub mod store;

pub use state::ImageState;
pub use store::BackupStore;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackupError {
    fn from(e: std::io::Error) -> Self {
        BackupError::Io(e.to_string())
    }
}
