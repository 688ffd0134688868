use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::SteamError;
use crate::paths::Paths;

/// A user found under `userdata/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteamUser {
    pub id: String,
    /// Persona name from localconfig.vdf. May be empty if unparsable.
    pub name: String,
    pub dir: PathBuf,
}

/// Returns all users in the installation.
///
/// A userdata entry counts as a user when it is a numeric directory with a
/// `config/localconfig.vdf`; anything else (including Steam's temporary
/// "0" directory) is skipped. The grid directory is created for each user
/// returned.
pub fn get_users(paths: &Paths) -> Result<Vec<SteamUser>, SteamError> {
    let entries = fs::read_dir(paths.user_data_dir()).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SteamError::NotFound
        } else {
            SteamError::Io(e.to_string())
        }
    })?;

    let mut users = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SteamError::Io(e.to_string()))?;
        let id = entry.file_name();
        let id = id.to_string_lossy();

        if id == "0" || id.parse::<u64>().is_err() {
            continue;
        }

        let config_path = paths.local_config_path(&id);
        let Ok(config) = fs::read_to_string(&config_path) else {
            // Without localconfig.vdf there is no persona name and no
            // usable game data for this directory.
            continue;
        };

        let name = extract_vdf_value(&config, "PersonaName").unwrap_or_default();
        if name.is_empty() {
            warn!(user_id = %id, "no persona name in localconfig.vdf");
        }

        paths.ensure_grid_dir(&id)?;

        let dir = paths.user_dir(&id);
        users.push(SteamUser {
            id: id.into_owned(),
            name,
            dir,
        });
    }

    users.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(users)
}

/// Pulls `"key" "value"` out of a text VDF without parsing the whole tree.
fn extract_vdf_value(content: &str, key: &str) -> Option<String> {
    let needle = format!("\"{key}\"");
    let rest = &content[content.find(&needle)? + needle.len()..];
    let start = rest.find('"')?;
    let rest = &rest[start + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_user(paths: &Paths, id: &str, persona: &str) {
        let config_dir = paths.config_dir(id);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            paths.local_config_path(id),
            format!("\"UserLocalConfigStore\"\n{{\n\t\"PersonaName\"\t\t\"{persona}\"\n}}\n"),
        )
        .unwrap();
    }

    #[test]
    fn extract_vdf_value_basic() {
        let content = "\"store\" { \"PersonaName\" \"gamer\" }";
        assert_eq!(extract_vdf_value(content, "PersonaName").unwrap(), "gamer");
        assert!(extract_vdf_value(content, "Missing").is_none());
    }

    #[test]
    fn finds_configured_users_only() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());

        write_user(&paths, "1001", "alpha");
        write_user(&paths, "1002", "beta");
        // Temporary dir and a dir without localconfig: both skipped.
        fs::create_dir_all(paths.config_dir("0")).unwrap();
        fs::create_dir_all(paths.user_dir("1003")).unwrap();
        // Non-numeric entry skipped.
        fs::create_dir_all(paths.user_data_dir().join("ac_cache")).unwrap();

        let users = get_users(&paths).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "1001");
        assert_eq!(users[0].name, "alpha");
        assert_eq!(users[0].dir, paths.user_dir("1001"));
        assert_eq!(users[1].name, "beta");
    }

    #[test]
    fn grid_dir_created_for_each_user() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());
        write_user(&paths, "7", "gamma");

        get_users(&paths).unwrap();
        assert!(paths.grid_dir("7").join("originals").is_dir());
    }

    #[test]
    fn missing_userdata_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path().join("nope"));
        assert!(matches!(get_users(&paths), Err(SteamError::NotFound)));
    }
}
