use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::paths::Paths;
use crate::users::SteamUser;
use crate::{SteamError, categories, shortcuts};

/// A game in the library, Steam or non-Steam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// Official app ID or shortcut ID, as a string.
    pub id: String,
    /// May be empty for games only known from the categories file.
    pub name: String,
    pub tags: Vec<String>,
    /// True for non-Steam shortcuts.
    pub custom: bool,
}

/// Filters applied while assembling the game list.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Only return non-Steam shortcuts.
    pub non_steam_only: bool,
    /// When non-empty, process exactly these app IDs and nothing else.
    pub app_ids: Vec<String>,
}

/// Assembles the game list for a user from local files.
///
/// Steam games come from the category file (IDs and tags; names are not
/// recorded locally), non-Steam games from shortcuts.vdf. An explicit
/// app-ID list bypasses discovery entirely.
pub fn collect_games(
    paths: &Paths,
    user: &SteamUser,
    options: &DiscoveryOptions,
) -> Result<Vec<Game>, SteamError> {
    if !options.app_ids.is_empty() {
        return Ok(options
            .app_ids
            .iter()
            .map(|id| Game {
                id: id.clone(),
                name: String::new(),
                tags: vec![],
                custom: false,
            })
            .collect());
    }

    let mut games: BTreeMap<String, Game> = BTreeMap::new();

    if !options.non_steam_only {
        let tags_by_id = categories::load_categories(&paths.shared_config_path(&user.id));
        for (id, tags) in tags_by_id {
            games.insert(
                id.clone(),
                Game {
                    id,
                    name: String::new(),
                    tags,
                    custom: false,
                },
            );
        }
    }

    let shortcuts_path = paths.shortcuts_path(&user.id);
    if shortcuts_path.exists() {
        match shortcuts::load_shortcuts(&shortcuts_path) {
            Ok(entries) => {
                for sc in entries {
                    games.insert(
                        sc.app_id.to_string(),
                        Game {
                            id: sc.app_id.to_string(),
                            name: sc.name,
                            tags: sc.tags,
                            custom: true,
                        },
                    );
                }
            }
            Err(e) => {
                // A corrupt shortcuts file shouldn't sink the Steam games.
                warn!(user_id = %user.id, error = %e, "failed to parse shortcuts.vdf");
            }
        }
    }

    debug!(user_id = %user.id, count = games.len(), "collected games");
    Ok(games.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_user(paths: &Paths, id: &str) -> SteamUser {
        fs::create_dir_all(paths.config_dir(id)).unwrap();
        SteamUser {
            id: id.into(),
            name: "tester".into(),
            dir: paths.user_dir(id),
        }
    }

    fn write_shared_config(paths: &Paths, user_id: &str, body: &str) {
        let path = paths.shared_config_path(user_id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn explicit_app_ids_bypass_discovery() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());
        let user = test_user(&paths, "1");

        let options = DiscoveryOptions {
            app_ids: vec!["440".into(), "620".into()],
            ..Default::default()
        };
        let games = collect_games(&paths, &user, &options).unwrap();
        assert_eq!(games.len(), 2);
        assert!(games.iter().all(|g| !g.custom && g.name.is_empty()));
    }

    #[test]
    fn steam_games_come_from_categories() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());
        let user = test_user(&paths, "1");
        write_shared_config(
            &paths,
            "1",
            r#""apps" { "440" { "tags" { "0" "favorites" } } }"#,
        );

        let games = collect_games(&paths, &user, &DiscoveryOptions::default()).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, "440");
        assert_eq!(games[0].tags, vec!["favorites"]);
        assert!(!games[0].custom);
    }

    #[test]
    fn non_steam_only_skips_categories() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());
        let user = test_user(&paths, "1");
        write_shared_config(
            &paths,
            "1",
            r#""apps" { "440" { "tags" { "0" "favorites" } } }"#,
        );

        let options = DiscoveryOptions {
            non_steam_only: true,
            ..Default::default()
        };
        let games = collect_games(&paths, &user, &options).unwrap();
        assert!(games.is_empty());
    }

    #[test]
    fn corrupt_shortcuts_file_is_tolerated() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());
        let user = test_user(&paths, "1");
        fs::write(paths.shortcuts_path("1"), b"\xff\xfe garbage").unwrap();

        let games = collect_games(&paths, &user, &DiscoveryOptions::default()).unwrap();
        assert!(games.is_empty());
    }
}
