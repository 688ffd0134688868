//! Loads the "overlays by category" directory into a lookup map.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use image::DynamicImage;
use tracing::{debug, warn};

use overgrid_model::ext::is_image_path;
use overgrid_model::normalize::{normalize_tag, overlay_key};
use overgrid_model::ArtStyle;

use crate::OverlayError;

/// Overlay images keyed by normalized tag plus art-style suffix
/// (`favorite.banner`, `rpg.cover`).
#[derive(Default)]
pub struct OverlaySet {
    overlays: HashMap<String, DynamicImage>,
}

impl OverlaySet {
    pub fn get(&self, tag: &str, style: ArtStyle) -> Option<&DynamicImage> {
        self.overlays.get(&overlay_key(tag, style))
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

/// Normalizes an overlay filename stem into a lookup key.
///
/// `Favorites.cover.png` keys as `favorite.cover`; a stem without any
/// style suffix is a banner overlay (`favorites.png` → `favorite.banner`).
fn overlay_name(stem: &str) -> String {
    for style in ArtStyle::all() {
        let suffix = style.file_suffix();
        if let Some(tag) = stem.strip_suffix(suffix) {
            return format!("{}{suffix}", normalize_tag(tag));
        }
    }
    overlay_key(stem, ArtStyle::Banner)
}

/// Reads every image in `dir`. A missing directory just means the user
/// has no overlays; files that fail to decode are skipped with a warning.
pub fn load_overlays(dir: &Path) -> Result<OverlaySet, OverlayError> {
    let mut set = OverlaySet::default();
    if !dir.is_dir() {
        return Ok(set);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_image_path(&path) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let bytes = fs::read(&path)?;
        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping undecodable overlay");
                continue;
            }
        };

        let key = overlay_name(stem);
        debug!(path = %path.display(), key, "loaded overlay");
        set.overlays.insert(key, image);
    }

    Ok(set)
}
