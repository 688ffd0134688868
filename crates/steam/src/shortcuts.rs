use std::fs;
use std::path::Path;

use crc32fast::Hasher;

use crate::SteamError;

/// Binary VDF type markers used in shortcuts.vdf.
const VDF_TYPE_OBJECT: u8 = 0x00;
const VDF_TYPE_STRING: u8 = 0x01;
const VDF_TYPE_INT32: u8 = 0x02;
const VDF_TYPE_END: u8 = 0x08;

/// A non-Steam game registered as a shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub app_id: u32,
    pub name: String,
    pub exe: String,
    /// Categories/tags, in file order.
    pub tags: Vec<String>,
}

/// Parses a binary VDF shortcuts file.
pub fn load_shortcuts(path: &Path) -> Result<Vec<Shortcut>, SteamError> {
    let data = fs::read(path)
        .map_err(|e| SteamError::Vdf(format!("failed to read shortcuts file: {e}")))?;
    parse_shortcuts(&data)
}

fn parse_shortcuts(data: &[u8]) -> Result<Vec<Shortcut>, SteamError> {
    if data.len() < 3 {
        return Err(SteamError::Vdf("shortcuts file too small".into()));
    }

    let mut pos = 0;

    if data[pos] != VDF_TYPE_OBJECT {
        return Err(SteamError::Vdf(format!(
            "expected object marker at start, got 0x{:02x}",
            data[pos]
        )));
    }
    pos += 1;

    let (name, new_pos) = read_string(data, pos)?;
    pos = new_pos;

    if !name.eq_ignore_ascii_case("shortcuts") {
        return Err(SteamError::Vdf(format!(
            "expected root key 'shortcuts', got '{name}'"
        )));
    }

    let mut shortcuts = Vec::new();

    while pos < data.len() {
        if data[pos] == VDF_TYPE_END {
            break;
        }

        if data[pos] != VDF_TYPE_OBJECT {
            return Err(SteamError::Vdf(format!(
                "expected object marker for shortcut at pos {pos}, got 0x{:02x}",
                data[pos]
            )));
        }
        pos += 1;

        // Skip the index key ("0", "1", ...).
        let (_, new_pos) = read_string(data, pos)?;
        pos = new_pos;

        let (sc, new_pos) = parse_shortcut_entry(data, pos)?;
        pos = new_pos;

        shortcuts.push(sc);
    }

    Ok(shortcuts)
}

fn parse_shortcut_entry(data: &[u8], mut pos: usize) -> Result<(Shortcut, usize), SteamError> {
    let mut sc = Shortcut {
        app_id: 0,
        name: String::new(),
        exe: String::new(),
        tags: vec![],
    };

    while pos < data.len() {
        if data[pos] == VDF_TYPE_END {
            pos += 1;
            // Older files carry no appid field; derive it the way Steam does.
            if sc.app_id == 0 {
                sc.app_id = generate_app_id(&sc.exe, &sc.name);
            }
            return Ok((sc, pos));
        }

        let type_byte = data[pos];
        pos += 1;

        let (key, new_pos) = read_string(data, pos)?;
        pos = new_pos;

        match type_byte {
            VDF_TYPE_STRING => {
                let (val, new_pos) = read_string(data, pos)?;
                pos = new_pos;

                match key.to_ascii_lowercase().as_str() {
                    "appname" => sc.name = val,
                    "exe" => sc.exe = val,
                    _ => {}
                }
            }
            VDF_TYPE_INT32 => {
                if pos + 4 > data.len() {
                    return Err(SteamError::Vdf(format!(
                        "unexpected end of data reading int32 for '{key}'"
                    )));
                }
                let val =
                    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
                pos += 4;

                if key.eq_ignore_ascii_case("appid") {
                    sc.app_id = val;
                }
            }
            VDF_TYPE_OBJECT => {
                if key.eq_ignore_ascii_case("tags") {
                    let (tags, new_pos) = parse_tags(data, pos)?;
                    pos = new_pos;
                    sc.tags = tags;
                } else {
                    pos = skip_object(data, pos)?;
                }
            }
            other => {
                return Err(SteamError::Vdf(format!(
                    "unknown VDF type 0x{other:02x} for key '{key}'"
                )));
            }
        }
    }

    Err(SteamError::Vdf("unterminated shortcut entry".into()))
}

/// Parses the tags object: string entries keyed "0", "1", ...
fn parse_tags(data: &[u8], mut pos: usize) -> Result<(Vec<String>, usize), SteamError> {
    let mut tags = Vec::new();
    while pos < data.len() {
        if data[pos] == VDF_TYPE_END {
            return Ok((tags, pos + 1));
        }
        if data[pos] != VDF_TYPE_STRING {
            return Err(SteamError::Vdf(format!(
                "expected string entry in tags, got 0x{:02x}",
                data[pos]
            )));
        }
        pos += 1;
        let (_, new_pos) = read_string(data, pos)?;
        pos = new_pos;
        let (tag, new_pos) = read_string(data, pos)?;
        pos = new_pos;
        tags.push(tag);
    }
    Err(SteamError::Vdf("unterminated tags object".into()))
}

/// Skips a nested object we don't care about.
fn skip_object(data: &[u8], mut pos: usize) -> Result<usize, SteamError> {
    while pos < data.len() {
        match data[pos] {
            VDF_TYPE_END => return Ok(pos + 1),
            VDF_TYPE_STRING => {
                pos += 1;
                let (_, new_pos) = read_string(data, pos)?;
                pos = new_pos;
                let (_, new_pos) = read_string(data, pos)?;
                pos = new_pos;
            }
            VDF_TYPE_INT32 => {
                pos += 1;
                let (_, new_pos) = read_string(data, pos)?;
                pos = new_pos + 4;
                if pos > data.len() {
                    return Err(SteamError::Vdf("unexpected end of int32".into()));
                }
            }
            VDF_TYPE_OBJECT => {
                pos += 1;
                let (_, new_pos) = read_string(data, pos)?;
                pos = skip_object(data, new_pos)?;
            }
            other => {
                return Err(SteamError::Vdf(format!(
                    "unknown VDF type 0x{other:02x} while skipping object"
                )));
            }
        }
    }
    Err(SteamError::Vdf("unterminated object".into()))
}

/// Reads a null-terminated string.
fn read_string(data: &[u8], pos: usize) -> Result<(String, usize), SteamError> {
    let end = data[pos..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| SteamError::Vdf("unterminated string".into()))?;
    let s = String::from_utf8_lossy(&data[pos..pos + end]).into_owned();
    Ok((s, pos + end + 1))
}

/// Generates a shortcut app ID from executable path and name.
///
/// Matches Steam's algorithm: `CRC32(exe + name) | 0x80000000 | 0x02000000`.
pub fn generate_app_id(exe: &str, name: &str) -> u32 {
    let key = format!("{exe}{name}");
    let mut hasher = Hasher::new();
    hasher.update(key.as_bytes());
    hasher.finalize() | 0x80000000 | 0x02000000
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a shortcuts.vdf blob in the binary VDF layout.
    fn build_vdf(entries: &[(Option<u32>, &str, &str, &[&str])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(VDF_TYPE_OBJECT);
        out.extend_from_slice(b"shortcuts\0");
        for (i, (app_id, name, exe, tags)) in entries.iter().enumerate() {
            out.push(VDF_TYPE_OBJECT);
            out.extend_from_slice(format!("{i}\0").as_bytes());
            if let Some(id) = app_id {
                out.push(VDF_TYPE_INT32);
                out.extend_from_slice(b"appid\0");
                out.extend_from_slice(&id.to_le_bytes());
            }
            out.push(VDF_TYPE_STRING);
            out.extend_from_slice(b"AppName\0");
            out.extend_from_slice(format!("{name}\0").as_bytes());
            out.push(VDF_TYPE_STRING);
            out.extend_from_slice(b"Exe\0");
            out.extend_from_slice(format!("{exe}\0").as_bytes());
            out.push(VDF_TYPE_OBJECT);
            out.extend_from_slice(b"tags\0");
            for (t, tag) in tags.iter().enumerate() {
                out.push(VDF_TYPE_STRING);
                out.extend_from_slice(format!("{t}\0").as_bytes());
                out.extend_from_slice(format!("{tag}\0").as_bytes());
            }
            out.push(VDF_TYPE_END);
            out.push(VDF_TYPE_END);
        }
        out.push(VDF_TYPE_END);
        out.push(VDF_TYPE_END);
        out
    }

    #[test]
    fn parses_entries_with_tags() {
        let data = build_vdf(&[
            (Some(3141592653), "Doom", "/games/doom", &["favorites", "FPS"]),
            (Some(2718281828), "Portal Mod", "/games/pm", &[]),
        ]);
        let shortcuts = parse_shortcuts(&data).unwrap();
        assert_eq!(shortcuts.len(), 2);
        assert_eq!(shortcuts[0].app_id, 3141592653);
        assert_eq!(shortcuts[0].name, "Doom");
        assert_eq!(shortcuts[0].exe, "/games/doom");
        assert_eq!(shortcuts[0].tags, vec!["favorites", "FPS"]);
        assert!(shortcuts[1].tags.is_empty());
    }

    #[test]
    fn missing_appid_is_generated() {
        let data = build_vdf(&[(None, "Old Game", "/games/old", &[])]);
        let shortcuts = parse_shortcuts(&data).unwrap();
        assert_eq!(shortcuts[0].app_id, generate_app_id("/games/old", "Old Game"));
    }

    #[test]
    fn generate_app_id_high_bits_set() {
        let id = generate_app_id("/bin/test", "Test");
        assert_ne!(id & 0x80000000, 0);
        assert_ne!(id & 0x02000000, 0);
        assert_eq!(id, generate_app_id("/bin/test", "Test"));
    }

    #[test]
    fn truncated_file_errors() {
        assert!(parse_shortcuts(&[0x00]).is_err());
        let mut data = build_vdf(&[(Some(1), "G", "/g", &[])]);
        data.truncate(data.len() / 2);
        assert!(parse_shortcuts(&data).is_err());
    }

    #[test]
    fn wrong_root_key_errors() {
        let mut data = Vec::new();
        data.push(VDF_TYPE_OBJECT);
        data.extend_from_slice(b"controller\0");
        data.push(VDF_TYPE_END);
        assert!(parse_shortcuts(&data).is_err());
    }
}
