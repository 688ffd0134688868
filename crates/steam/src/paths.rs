use std::fs;
use std::path::{Path, PathBuf};

use crate::SteamError;

/// Provides access to Steam directory paths.
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Auto-detects the Steam installation directory.
    pub fn new() -> Result<Self, SteamError> {
        Ok(Self {
            base_dir: detect_install_dir(None)?,
        })
    }

    /// Uses an explicit base directory (also the test entry point).
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.base_dir.join("userdata")
    }

    pub fn user_dir(&self, user_id: &str) -> PathBuf {
        self.user_data_dir().join(user_id)
    }

    pub fn config_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("config")
    }

    /// Path to `localconfig.vdf`, required for a directory to count as a user.
    pub fn local_config_path(&self, user_id: &str) -> PathBuf {
        self.config_dir(user_id).join("localconfig.vdf")
    }

    /// Path to the text VDF holding per-game category tags.
    pub fn shared_config_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("7").join("remote").join("sharedconfig.vdf")
    }

    /// Path to the binary VDF holding non-Steam shortcuts.
    pub fn shortcuts_path(&self, user_id: &str) -> PathBuf {
        self.config_dir(user_id).join("shortcuts.vdf")
    }

    /// Grid artwork directory for a user.
    pub fn grid_dir(&self, user_id: &str) -> PathBuf {
        self.config_dir(user_id).join("grid")
    }

    /// Creates the grid directory (and its `originals` subdir) if missing.
    pub fn ensure_grid_dir(&self, user_id: &str) -> Result<(), SteamError> {
        let grid = self.grid_dir(user_id);
        fs::create_dir_all(grid.join("originals"))
            .map_err(|e| SteamError::Io(format!("failed to create grid dir: {e}")))
    }
}

/// Finds the Steam installation directory.
///
/// An explicit directory wins; otherwise the usual Linux, macOS and
/// Windows locations are probed in order.
pub fn detect_install_dir(explicit: Option<&Path>) -> Result<PathBuf, SteamError> {
    if let Some(dir) = explicit {
        if dir.is_dir() {
            return Ok(dir.to_path_buf());
        }
        return Err(SteamError::Io(format!(
            "not a valid Steam directory: {}",
            dir.display()
        )));
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        candidates.push(home.join(".local").join("share").join("Steam"));
        candidates.push(home.join(".steam").join("steam"));
        candidates.push(home.join("Library").join("Application Support").join("Steam"));
    }
    for var in ["ProgramFiles(x86)", "ProgramFiles"] {
        if let Ok(pf) = std::env::var(var) {
            candidates.push(PathBuf::from(pf).join("Steam"));
        }
    }

    candidates
        .into_iter()
        .find(|p| p.is_dir())
        .ok_or(SteamError::NotFound)
}
