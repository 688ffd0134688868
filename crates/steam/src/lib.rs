//! Local Steam library discovery.
//!
//! Finds the Steam installation, enumerates users, and assembles the game
//! list (categories from `sharedconfig.vdf`, non-Steam shortcuts from the
//! binary `shortcuts.vdf`). The artwork pipeline consumes the plain
//! records produced here and never touches these files itself.

pub mod categories;
pub mod games;
pub mod paths;
pub mod shortcuts;
pub mod users;

pub use games::{DiscoveryOptions, Game, collect_games};
pub use paths::Paths;
pub use users::SteamUser;

/// Errors from library discovery.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("Steam installation not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("VDF parse error: {0}")]
    Vdf(String),
}
