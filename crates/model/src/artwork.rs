use std::fmt;

use serde::{Deserialize, Serialize};

use crate::style::ArtStyle;

/// One unit of work: fetch and decorate artwork for a game in one style.
///
/// Built fresh each run by the discovery collaborator and discarded after
/// processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRequest {
    /// Official app ID or generated shortcut ID.
    pub game_id: String,
    /// Display name. May be empty for games only known from local files.
    pub game_name: String,
    pub art_style: ArtStyle,
    /// User categories plus Steam tags, in the order they were discovered.
    pub tags: Vec<String>,
    /// Non-Steam shortcut — Steam CDN and by-ID lookups are skipped.
    pub custom: bool,
}

/// Where a clean image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    SteamServer,
    SteamGridDb,
    Igdb,
    Search,
    /// Existing content-addressed backup.
    Backup,
    /// Pre-hash backup naming, migrated on load.
    LegacyBackup,
    /// User-provided file in the override directory.
    Override,
    /// A file at the canonical path that matches no backup record.
    Manual,
}

impl Provenance {
    /// True when the image came from the local disk rather than a provider.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Provenance::Backup
                | Provenance::LegacyBackup
                | Provenance::Override
                | Provenance::Manual
        )
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provenance::SteamServer => "steam server",
            Provenance::SteamGridDb => "SteamGridDB",
            Provenance::Igdb => "IGDB",
            Provenance::Search => "search",
            Provenance::Backup => "backup",
            Provenance::LegacyBackup => "legacy backup (migrated)",
            Provenance::Override => "local override",
            Provenance::Manual => "manual customization",
        };
        write!(f, "{s}")
    }
}

/// A clean (pre-overlay) image plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArtwork {
    pub bytes: Vec<u8>,
    /// Extension without the leading dot ("jpg", "png", "webp").
    pub ext: String,
    pub provenance: Provenance,
}

/// Output of the compositor: final encoded bytes and their extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeResult {
    pub bytes: Vec<u8>,
    pub ext: String,
}
