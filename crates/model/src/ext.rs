//! Image file extension rules shared by the resolver and the backup store.

use std::path::Path;

/// Extensions recognized as grid images when scanning directories.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Returns true if the path carries a recognized image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Derives the stored extension for a downloaded image.
///
/// Content type wins over the URL extension; with neither we fall back to
/// "jpg", which Steam accepts regardless of the actual encoding.
/// "jpeg" is folded into "jpg" and "octet-stream" (steamgriddb's S3 URLs)
/// into "png".
pub fn extension_from(content_type: Option<&str>, url_path: &str) -> String {
    let raw = match content_type {
        Some(ct) if !ct.is_empty() => ct
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase(),
        _ => Path::new(url_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase(),
    };

    normalize_extension(&raw)
}

/// Applies the jpeg/octet-stream fixups and the jpg default.
pub fn normalize_extension(ext: &str) -> String {
    match ext.trim_start_matches('.') {
        "" => "jpg".into(),
        "jpeg" => "jpg".into(),
        "octet-stream" => "png".into(),
        other => other.to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_wins_over_url() {
        assert_eq!(
            extension_from(Some("image/png"), "/apps/440/header.jpg"),
            "png"
        );
    }

    #[test]
    fn url_extension_fallback() {
        assert_eq!(extension_from(None, "/apps/440/header.jpg"), "jpg");
        assert_eq!(extension_from(Some(""), "/grid/abc.webp"), "webp");
    }

    #[test]
    fn default_is_jpg() {
        assert_eq!(extension_from(None, "/apps/440/header"), "jpg");
    }

    #[test]
    fn jpeg_folded_into_jpg() {
        assert_eq!(extension_from(Some("image/jpeg"), ""), "jpg");
        assert_eq!(normalize_extension(".jpeg"), "jpg");
    }

    #[test]
    fn octet_stream_means_png() {
        assert_eq!(extension_from(Some("application/octet-stream"), ""), "png");
    }

    #[test]
    fn content_type_parameters_ignored() {
        assert_eq!(extension_from(Some("image/png; charset=binary"), ""), "png");
    }

    #[test]
    fn image_path_filter() {
        assert!(is_image_path(Path::new("440.png")));
        assert!(is_image_path(Path::new("440.JPG")));
        assert!(is_image_path(Path::new("440p.webp")));
        assert!(!is_image_path(Path::new("440.txt")));
        assert!(!is_image_path(Path::new("440")));
    }
}
