//! Official Steam CDN artwork, tried before any third-party provider.

use overgrid_model::{ArtworkRequest, Provenance};

use crate::resolver::{ArtSource, LocateFuture};

/// Akamai answers faster and carries more images, so it goes first.
const MIRRORS: [&str; 2] = [
    "https://steamcdn-a.akamaihd.net/steam/apps",
    "https://cdn.akamai.steamstatic.com/steam/apps",
];

/// Both CDN mirrors for the style's canonical filename.
pub struct SteamCdn;

impl ArtSource for SteamCdn {
    fn provenance(&self) -> Provenance {
        Provenance::SteamServer
    }

    fn applies(&self, request: &ArtworkRequest) -> bool {
        // Shortcut IDs are generated locally and mean nothing to the CDN.
        !request.custom
    }

    fn locate<'a>(&'a self, request: &'a ArtworkRequest) -> LocateFuture<'a> {
        Box::pin(async move {
            let segment = request.art_style.steam_segment();
            Ok(MIRRORS
                .iter()
                .map(|mirror| format!("{mirror}/{}/{segment}", request.game_id))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overgrid_model::ArtStyle;

    fn request(style: ArtStyle, custom: bool) -> ArtworkRequest {
        ArtworkRequest {
            game_id: "440".into(),
            game_name: "Team Fortress 2".into(),
            art_style: style,
            tags: vec![],
            custom,
        }
    }

    #[tokio::test]
    async fn yields_both_mirrors_in_order() {
        let urls = SteamCdn
            .locate(&request(ArtStyle::Cover, false))
            .await
            .unwrap();
        assert_eq!(
            urls,
            vec![
                "https://steamcdn-a.akamaihd.net/steam/apps/440/library_600x900_2x.jpg",
                "https://cdn.akamai.steamstatic.com/steam/apps/440/library_600x900_2x.jpg",
            ]
        );
    }

    #[test]
    fn skips_non_steam_shortcuts() {
        assert!(SteamCdn.applies(&request(ArtStyle::Banner, false)));
        assert!(!SteamCdn.applies(&request(ArtStyle::Banner, true)));
    }
}
