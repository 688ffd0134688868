//! IGDB provider. The catalog is nearly all box art, so it only serves
//! cover requests.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use overgrid_model::{ArtStyle, ArtworkRequest, Provenance};

use crate::client::Fetcher;
use crate::resolver::{ArtSource, LocateFuture};
use crate::SourceError;

const GAMES_URL: &str = "https://api-v3.igdb.com/games";
const COVERS_URL: &str = "https://api-v3.igdb.com/covers";

pub struct Igdb {
    fetcher: Arc<dyn Fetcher>,
    api_key: String,
}

#[derive(Deserialize)]
struct IgdbGame {
    #[serde(default)]
    cover: u64,
}

#[derive(Deserialize)]
struct IgdbCover {
    image_id: String,
}

impl Igdb {
    pub fn new(fetcher: Arc<dyn Fetcher>, api_key: String) -> Self {
        Self { fetcher, api_key }
    }

    async fn post(&self, url: &str, body: String) -> Result<Vec<u8>, SourceError> {
        let headers = [
            ("user-key", self.api_key.clone()),
            ("Accept", "application/json".to_string()),
        ];
        let response = self.fetcher.post(url, body, &headers).await?;
        Ok(response.bytes)
    }

    async fn locate_inner(
        &self,
        request: &ArtworkRequest,
    ) -> Result<Vec<String>, SourceError> {
        let body = format!("fields name,cover; search \"{}\";", request.game_name);
        let bytes = self.post(GAMES_URL, body).await?;
        // IGDB reports errors as a JSON object instead of the expected
        // array; treat anything unparseable as a miss.
        let Ok(games) = serde_json::from_slice::<Vec<IgdbGame>>(&bytes) else {
            debug!(game_name = %request.game_name, "unparseable IGDB games response");
            return Ok(vec![]);
        };
        let Some(cover) = games.first().map(|g| g.cover).filter(|&c| c != 0) else {
            return Ok(vec![]);
        };

        let bytes = self
            .post(COVERS_URL, format!("fields image_id; where id = {cover};"))
            .await?;
        let Ok(covers) = serde_json::from_slice::<Vec<IgdbCover>>(&bytes) else {
            debug!(game_name = %request.game_name, "unparseable IGDB covers response");
            return Ok(vec![]);
        };
        Ok(covers
            .into_iter()
            .next()
            .map(|c| {
                format!(
                    "https://images.igdb.com/igdb/image/upload/t_720p/{}.jpg",
                    c.image_id
                )
            })
            .into_iter()
            .collect())
    }
}

impl ArtSource for Igdb {
    fn provenance(&self) -> Provenance {
        Provenance::Igdb
    }

    fn applies(&self, request: &ArtworkRequest) -> bool {
        request.art_style == ArtStyle::Cover && !request.game_name.is_empty()
    }

    fn locate<'a>(&'a self, request: &'a ArtworkRequest) -> LocateFuture<'a> {
        Box::pin(self.locate_inner(request))
    }
}
