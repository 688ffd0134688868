//! Tag and filename normalization rules.

use regex::Regex;

use crate::style::ArtStyle;

/// Normalizes a category tag for overlay lookup.
///
/// Lower-cased, trailing plural "s" runs trimmed, and `<`, `>`, `/`
/// replaced with `-` because they can't appear in Windows paths.
pub fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase()
        .trim_end_matches('s')
        .replace(['<', '>', '/'], "-")
}

/// Overlay map key for a tag and art style (`favorite.cover`).
pub fn overlay_key(tag: &str, style: ArtStyle) -> String {
    format!("{}{}", normalize_tag(tag), style.file_suffix())
}

/// Builds a case-insensitive matcher for override files named after a game.
///
/// Runs of non-alphanumeric characters in the name match anything, so
/// `"Half-Life 2"` matches `half life 2.banner.png` and
/// `Half_Life_2.banner.jpg`. Returns None for names with no usable
/// characters.
pub fn name_matcher(game_name: &str, style: ArtStyle) -> Option<Regex> {
    let mut pattern = String::new();
    let mut in_gap = false;
    for c in game_name.chars() {
        if c.is_alphanumeric() {
            pattern.push_str(&regex::escape(&c.to_string()));
            in_gap = false;
        } else if !in_gap {
            pattern.push_str(".*");
            in_gap = true;
        }
    }
    if pattern.is_empty() || pattern == ".*" {
        return None;
    }

    let suffix = regex::escape(style.file_suffix());
    Regex::new(&format!(r"(?i)^{pattern}{suffix}\.[^.]+$")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_lowercased_and_depluralized() {
        assert_eq!(normalize_tag("Favorites"), "favorite");
        assert_eq!(normalize_tag("RPGs"), "rpg");
        assert_eq!(normalize_tag("Action"), "action");
    }

    #[test]
    fn trailing_s_run_trimmed() {
        // Matches the original behavior: every trailing 's' goes.
        assert_eq!(normalize_tag("Chess"), "che");
    }

    #[test]
    fn path_hostile_characters_replaced() {
        assert_eq!(normalize_tag("Co-op </>"), "co-op ---");
    }

    #[test]
    fn overlay_keys_carry_style_suffix() {
        assert_eq!(overlay_key("Favorites", ArtStyle::Banner), "favorite.banner");
        assert_eq!(overlay_key("Favorites", ArtStyle::Cover), "favorite.cover");
    }

    #[test]
    fn name_matcher_collapses_separators() {
        let re = name_matcher("Half-Life 2", ArtStyle::Banner).unwrap();
        assert!(re.is_match("Half-Life 2.banner.png"));
        assert!(re.is_match("half_life_2.banner.jpg"));
        assert!(re.is_match("HALF LIFE 2.banner.webp"));
        assert!(!re.is_match("Half-Life 2.cover.png"));
        assert!(!re.is_match("Portal 2.banner.png"));
    }

    #[test]
    fn name_matcher_rejects_empty_names() {
        assert!(name_matcher("", ArtStyle::Banner).is_none());
        assert!(name_matcher("---", ArtStyle::Banner).is_none());
    }
}
