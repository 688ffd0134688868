use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use overgrid_model::ext::{is_image_path, normalize_extension, IMAGE_EXTENSIONS};
use overgrid_model::normalize::name_matcher;
use overgrid_model::{ArtStyle, Provenance, RawArtwork};

use crate::state::ImageState;
use crate::BackupError;

/// Backup and recovery for one user's grid directory.
pub struct BackupStore {
    grid_dir: PathBuf,
    override_dir: Option<PathBuf>,
}

impl BackupStore {
    pub fn new(grid_dir: impl Into<PathBuf>, override_dir: Option<PathBuf>) -> Self {
        Self {
            grid_dir: grid_dir.into(),
            override_dir,
        }
    }

    pub fn grid_dir(&self) -> &Path {
        &self.grid_dir
    }

    pub fn originals_dir(&self) -> PathBuf {
        self.grid_dir.join("originals")
    }

    /// Filename stem shared by everything belonging to one unit
    /// (`440`, `440p`, `440_hero`, `440_logo`).
    fn unit_name(game_id: &str, style: ArtStyle) -> String {
        format!("{game_id}{}", style.id_suffix())
    }

    /// Where the decorated image for this unit lives.
    pub fn canonical_path(&self, game_id: &str, style: ArtStyle, ext: &str) -> PathBuf {
        self.grid_dir
            .join(format!("{}.{ext}", Self::unit_name(game_id, style)))
    }

    /// Content-addressed backup path: the hash is over the DECORATED
    /// bytes, so next run the canonical file leads back to its clean
    /// source; the extension is the clean image's own.
    pub fn backup_path(
        &self,
        game_id: &str,
        style: ArtStyle,
        decorated: &[u8],
        clean_ext: &str,
    ) -> PathBuf {
        let hash = hex::encode(Sha256::digest(decorated));
        self.originals_dir()
            .join(format!("{} {hash}.{clean_ext}", Self::unit_name(game_id, style)))
    }

    /// Classifies what is already on disk for this unit, in precedence
    /// order: override file, legacy backup, canonical image (matched to a
    /// backup or not), nothing.
    pub fn classify(
        &self,
        game_id: &str,
        style: ArtStyle,
        game_name: &str,
    ) -> Result<ImageState, BackupError> {
        if let Some(path) = self.find_override(game_id, style, game_name)? {
            return Ok(ImageState::Override(path));
        }

        let unit = Self::unit_name(game_id, style);
        if let Some(path) = self.find_legacy(&unit)? {
            return Ok(ImageState::Legacy(path));
        }

        for ext in IMAGE_EXTENSIONS {
            let canonical = self.canonical_path(game_id, style, ext);
            if !canonical.is_file() {
                continue;
            }
            let decorated = fs::read(&canonical)?;
            if let Some(backup) = self.find_backup(&unit, &decorated) {
                return Ok(ImageState::Backup { canonical, backup });
            }
            return Ok(ImageState::Manual(canonical));
        }

        Ok(ImageState::Absent)
    }

    /// Loads the clean image for this unit, if any exists on disk.
    ///
    /// A legacy backup stays on disk here; `store` removes it once the
    /// content-addressed copy exists, so a failed unit never loses the
    /// only clean copy.
    pub fn recover(
        &self,
        game_id: &str,
        style: ArtStyle,
        game_name: &str,
    ) -> Result<Option<RawArtwork>, BackupError> {
        match self.classify(game_id, style, game_name)? {
            ImageState::Override(path) => Ok(Some(load(&path, Provenance::Override)?)),
            ImageState::Legacy(path) => {
                debug!(game_id, path = %path.display(), "found legacy backup");
                Ok(Some(load(&path, Provenance::LegacyBackup)?))
            }
            ImageState::Backup { backup, .. } => Ok(Some(load(&backup, Provenance::Backup)?)),
            ImageState::Manual(path) => Ok(Some(load(&path, Provenance::Manual)?)),
            ImageState::Absent => Ok(None),
        }
    }

    /// Saves the clean image under the decorated result's hash. A no-op
    /// when that backup already exists, which is what makes repeated runs
    /// cheap.
    pub fn store(
        &self,
        game_id: &str,
        style: ArtStyle,
        clean: &RawArtwork,
        decorated: &[u8],
    ) -> Result<PathBuf, BackupError> {
        let path = self.backup_path(game_id, style, decorated, &clean.ext);
        if !path.is_file() {
            fs::create_dir_all(self.originals_dir())?;
            fs::write(&path, &clean.bytes)?;
            debug!(game_id, path = %path.display(), "stored clean backup");
        }
        // The content-addressed copy exists now; a legacy backup file is
        // superseded and can go.
        self.remove_legacy(game_id, style)?;
        Ok(path)
    }

    /// Removes canonical images and backups for this unit whose extension
    /// is not in `keep`, so a format change doesn't leave both a `.png`
    /// and a `.webp` behind for Steam to pick between.
    pub fn purge_stale(
        &self,
        game_id: &str,
        style: ArtStyle,
        keep: &[&str],
    ) -> Result<(), BackupError> {
        let unit = Self::unit_name(game_id, style);

        for ext in IMAGE_EXTENSIONS {
            if keep.contains(ext) {
                continue;
            }
            let canonical = self.canonical_path(game_id, style, ext);
            if canonical.is_file() {
                fs::remove_file(&canonical)?;
                debug!(game_id, path = %canonical.display(), "removed stale image");
            }
        }

        let originals = self.originals_dir();
        if !originals.is_dir() {
            return Ok(());
        }
        let prefix = format!("{unit} ");
        for entry in fs::read_dir(&originals)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&prefix) || !is_image_path(&path) {
                continue;
            }
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            if !keep.contains(&ext.as_str()) {
                fs::remove_file(&path)?;
                debug!(game_id, path = %path.display(), "removed stale backup");
            }
        }
        Ok(())
    }

    fn find_override(
        &self,
        game_id: &str,
        style: ArtStyle,
        game_name: &str,
    ) -> Result<Option<PathBuf>, BackupError> {
        let Some(dir) = self.override_dir.as_ref().filter(|d| d.is_dir()) else {
            return Ok(None);
        };

        let unit = Self::unit_name(game_id, style);
        for ext in IMAGE_EXTENSIONS {
            let path = dir.join(format!("{unit}.{ext}"));
            if path.is_file() {
                return Ok(Some(path));
            }
        }

        let Some(matcher) = name_matcher(game_name, style) else {
            return Ok(None);
        };
        let mut names: Vec<String> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        for name in names {
            if is_image_path(Path::new(&name)) && matcher.is_match(&name) {
                return Ok(Some(dir.join(name)));
            }
        }
        Ok(None)
    }

    fn remove_legacy(&self, game_id: &str, style: ArtStyle) -> Result<(), BackupError> {
        let unit = Self::unit_name(game_id, style);
        while let Some(path) = self.find_legacy(&unit)? {
            fs::remove_file(&path)?;
            info!(game_id, path = %path.display(), "migrated legacy backup");
        }
        Ok(())
    }

    fn find_legacy(&self, unit: &str) -> Result<Option<PathBuf>, BackupError> {
        if !self.grid_dir.is_dir() {
            return Ok(None);
        }
        let prefix = format!("{unit} (original)");
        let mut matches: Vec<PathBuf> = fs::read_dir(&self.grid_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();
        matches.sort();
        Ok(matches.into_iter().next())
    }

    /// Looks for a backup addressed by the decorated bytes, regardless of
    /// what extension the clean image had.
    fn find_backup(&self, unit: &str, decorated: &[u8]) -> Option<PathBuf> {
        let hash = hex::encode(Sha256::digest(decorated));
        for ext in IMAGE_EXTENSIONS {
            let path = self.originals_dir().join(format!("{unit} {hash}.{ext}"));
            if path.is_file() {
                return Some(path);
            }
        }
        None
    }
}

fn load(path: &Path, provenance: Provenance) -> Result<RawArtwork, BackupError> {
    let bytes = fs::read(path)?;
    let ext = normalize_extension(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default(),
    );
    Ok(RawArtwork {
        bytes,
        ext,
        provenance,
    })
}
