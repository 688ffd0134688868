use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Extracts per-game category tags from `sharedconfig.vdf`.
///
/// The file is text VDF; the two-level pattern match pulls each numeric
/// app block's `tags` object without parsing the whole tree. Returns a
/// map of app ID to tags in file order. A missing or unreadable file
/// yields an empty map — many installations simply have no categories.
pub fn load_categories(path: &Path) -> BTreeMap<String, Vec<String>> {
    let Ok(content) = fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    parse_categories(&content)
}

fn parse_categories(content: &str) -> BTreeMap<String, Vec<String>> {
    static GAME_RE: OnceLock<Regex> = OnceLock::new();
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let game_re = GAME_RE.get_or_init(|| {
        Regex::new(r#""([0-9]+)"\s*\{[^}]+?"tags"\s*\{([^}]*?)\}"#).unwrap()
    });
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r#""[0-9]+"\s*"([^"]+)""#).unwrap());

    let mut categories = BTreeMap::new();
    for game in game_re.captures_iter(content) {
        let app_id = game[1].to_string();
        let tags: Vec<String> = tag_re
            .captures_iter(&game[2])
            .map(|c| c[1].to_string())
            .collect();
        if !tags.is_empty() {
            categories.insert(app_id, tags);
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED_CONFIG: &str = r#"
"UserRoamingConfigStore"
{
    "Software"
    {
        "Valve"
        {
            "Steam"
            {
                "apps"
                {
                    "440"
                    {
                        "tags"
                        {
                            "0"     "favorites"
                            "1"     "Shooters"
                        }
                    }
                    "570"
                    {
                        "cloudenabled"  "1"
                    }
                    "620"
                    {
                        "cloudenabled"  "1"
                        "tags"
                        {
                            "0"     "Puzzle"
                        }
                    }
                }
            }
        }
    }
}
"#;

    #[test]
    fn parses_tag_blocks() {
        let cats = parse_categories(SHARED_CONFIG);
        assert_eq!(cats["440"], vec!["favorites", "Shooters"]);
        assert_eq!(cats["620"], vec!["Puzzle"]);
        assert!(!cats.contains_key("570"));
    }

    #[test]
    fn missing_file_yields_empty_map() {
        let cats = load_categories(Path::new("/nonexistent/sharedconfig.vdf"));
        assert!(cats.is_empty());
    }

    #[test]
    fn empty_content_yields_empty_map() {
        assert!(parse_categories("").is_empty());
    }
}
