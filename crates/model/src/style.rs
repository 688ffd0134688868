use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported grid artwork categories.
///
/// Each style carries its own filename convention, Steam CDN path segment
/// and expected dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtStyle {
    /// 460x215 / 920x430 horizontal banner (`header.jpg`).
    Banner,
    /// 300x450 / 600x900 vertical library capsule.
    Cover,
    /// 1920x620 / 3840x1240 library hero.
    Hero,
    /// 640x360 / 1280x720 transparent logo.
    Logo,
}

impl ArtStyle {
    /// Returns all art styles in processing order.
    pub fn all() -> &'static [ArtStyle] {
        &[
            ArtStyle::Banner,
            ArtStyle::Cover,
            ArtStyle::Hero,
            ArtStyle::Logo,
        ]
    }

    /// Suffix appended to the game ID in grid filenames (`440p.png`).
    pub fn id_suffix(&self) -> &'static str {
        match self {
            ArtStyle::Banner => "",
            ArtStyle::Cover => "p",
            ArtStyle::Hero => "_hero",
            ArtStyle::Logo => "_logo",
        }
    }

    /// Suffix used in overlay and override filenames (`favorites.cover.png`).
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ArtStyle::Banner => ".banner",
            ArtStyle::Cover => ".cover",
            ArtStyle::Hero => ".hero",
            ArtStyle::Logo => ".logo",
        }
    }

    /// Canonical filename on the Steam CDN for this style.
    pub fn steam_segment(&self) -> &'static str {
        match self {
            ArtStyle::Banner => "header.jpg",
            ArtStyle::Cover => "library_600x900_2x.jpg",
            ArtStyle::Hero => "library_hero.jpg",
            ArtStyle::Logo => "logo.png",
        }
    }

    /// High-quality (width, height) in pixels.
    pub fn hq_dimensions(&self) -> (u32, u32) {
        match self {
            ArtStyle::Banner => (920, 430),
            ArtStyle::Cover => (600, 900),
            ArtStyle::Hero => (3840, 1240),
            ArtStyle::Logo => (1280, 720),
        }
    }

    /// Low-quality (width, height) in pixels.
    pub fn lq_dimensions(&self) -> (u32, u32) {
        match self {
            ArtStyle::Banner => (460, 215),
            ArtStyle::Cover => (300, 450),
            ArtStyle::Hero => (1920, 620),
            ArtStyle::Logo => (640, 360),
        }
    }

    /// Aspect-ratio guard for downloaded candidates.
    ///
    /// Banners must be strictly wider than tall and covers strictly taller
    /// than wide; squares fail both. Hero and logo artwork is not checked.
    pub fn aspect_ok(&self, width: u32, height: u32) -> bool {
        match self {
            ArtStyle::Banner => width > height,
            ArtStyle::Cover => height > width,
            ArtStyle::Hero | ArtStyle::Logo => true,
        }
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtStyle::Banner => write!(f, "Banner"),
            ArtStyle::Cover => write!(f, "Cover"),
            ArtStyle::Hero => write!(f, "Hero"),
            ArtStyle::Logo => write!(f, "Logo"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_suffixes() {
        assert_eq!(ArtStyle::Banner.id_suffix(), "");
        assert_eq!(ArtStyle::Cover.id_suffix(), "p");
        assert_eq!(ArtStyle::Hero.id_suffix(), "_hero");
        assert_eq!(ArtStyle::Logo.id_suffix(), "_logo");
    }

    #[test]
    fn steam_segments() {
        assert_eq!(ArtStyle::Banner.steam_segment(), "header.jpg");
        assert_eq!(ArtStyle::Cover.steam_segment(), "library_600x900_2x.jpg");
        assert_eq!(ArtStyle::Hero.steam_segment(), "library_hero.jpg");
        assert_eq!(ArtStyle::Logo.steam_segment(), "logo.png");
    }

    #[test]
    fn dimensions_hq_double_lq() {
        for style in ArtStyle::all() {
            let (hw, hh) = style.hq_dimensions();
            let (lw, lh) = style.lq_dimensions();
            assert_eq!(hw, lw * 2, "{style} width");
            assert_eq!(hh, lh * 2, "{style} height");
        }
    }

    #[test]
    fn banner_aspect_guard() {
        assert!(ArtStyle::Banner.aspect_ok(460, 215));
        assert!(!ArtStyle::Banner.aspect_ok(215, 460));
        // Square counts as a mismatch.
        assert!(!ArtStyle::Banner.aspect_ok(300, 300));
    }

    #[test]
    fn cover_aspect_guard() {
        assert!(ArtStyle::Cover.aspect_ok(600, 900));
        assert!(!ArtStyle::Cover.aspect_ok(900, 600));
        assert!(!ArtStyle::Cover.aspect_ok(300, 300));
    }

    #[test]
    fn hero_logo_not_guarded() {
        assert!(ArtStyle::Hero.aspect_ok(100, 100));
        assert!(ArtStyle::Logo.aspect_ok(1, 999));
    }
}
