//! SteamGridDB API v2 provider.
//!
//! Lookup order per quality tier: by Steam app ID, then (on 404 or for
//! non-Steam shortcuts) autocomplete search by name with similarity
//! ranking, then the ranked game's own image listing. HQ dimensions are
//! tried before LQ; requesting both at once scrambles the results with
//! no size indicator, so each tier is its own query.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use tracing::debug;

use overgrid_model::{ArtStyle, ArtworkRequest, Provenance};

use crate::client::Fetcher;
use crate::resolver::{ArtSource, LocateFuture};
use crate::SourceError;

const BASE_URL: &str = "https://www.steamgriddb.com/api/v2";

/// Characters escaped when a game name becomes a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?');

#[derive(Debug, Clone)]
pub struct SteamGridDbConfig {
    pub api_key: String,
    /// Comma-separated style filter, e.g. "alternate,material".
    pub styles: String,
    /// Comma-separated type filter, e.g. "static,animated".
    pub types: String,
}

pub struct SteamGridDb {
    fetcher: Arc<dyn Fetcher>,
    config: SteamGridDbConfig,
}

#[derive(Deserialize)]
struct ImageList {
    success: bool,
    #[serde(default)]
    data: Vec<ImageEntry>,
}

#[derive(Deserialize)]
struct ImageEntry {
    url: String,
}

#[derive(Deserialize)]
struct SearchList {
    success: bool,
    #[serde(default)]
    data: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    id: i64,
    name: String,
}

fn endpoint(style: ArtStyle) -> &'static str {
    match style {
        ArtStyle::Banner | ArtStyle::Cover => "grids",
        ArtStyle::Hero => "heroes",
        ArtStyle::Logo => "logos",
    }
}

impl SteamGridDb {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: SteamGridDbConfig) -> Self {
        Self { fetcher, config }
    }

    fn filter(&self, dimensions: (u32, u32)) -> String {
        format!(
            "?styles={}&types={}&dimensions={}x{}",
            self.config.styles, self.config.types, dimensions.0, dimensions.1
        )
    }

    /// GET with Bearer auth. 401 is the circuit-breaker signal; 404 is a
    /// soft miss surfaced as `None`.
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let headers = [(
            "Authorization",
            format!("Bearer {}", self.config.api_key),
        )];
        let response = self.fetcher.get(url, &headers).await?;
        match response.status {
            401 => Err(SourceError::AuthInvalid),
            404 => Ok(None),
            status if status >= 400 => Err(SourceError::Status {
                url: url.to_string(),
                status,
            }),
            _ => Ok(Some(response.bytes)),
        }
    }

    fn parse_images(url: &str, bytes: &[u8]) -> Result<Option<String>, SourceError> {
        let list: ImageList =
            serde_json::from_slice(bytes).map_err(|e| SourceError::Api {
                provider: "SteamGridDB",
                reason: format!("bad image listing from {url}: {e}"),
            })?;
        if list.success {
            Ok(list.data.into_iter().next().map(|entry| entry.url))
        } else {
            Ok(None)
        }
    }

    /// Resolves the SteamGridDB game ID via autocomplete search, picking
    /// the result whose name is closest to ours.
    async fn search_game_id(
        &self,
        name: &str,
        filter: &str,
    ) -> Result<Option<i64>, SourceError> {
        let encoded = utf8_percent_encode(name, SEGMENT);
        let url = format!("{BASE_URL}/search/autocomplete/{encoded}{filter}");
        let Some(bytes) = self.get(&url).await? else {
            return Ok(None);
        };
        let list: SearchList =
            serde_json::from_slice(&bytes).map_err(|e| SourceError::Api {
                provider: "SteamGridDB",
                reason: format!("bad search response for {name:?}: {e}"),
            })?;
        if !list.success {
            return Ok(None);
        }
        let best = list.data.into_iter().max_by(|a, b| {
            let sa = strsim::jaro_winkler(&a.name.to_lowercase(), &name.to_lowercase());
            let sb = strsim::jaro_winkler(&b.name.to_lowercase(), &name.to_lowercase());
            sa.total_cmp(&sb)
        });
        Ok(best.map(|entry| entry.id))
    }

    async fn locate_inner(
        &self,
        request: &ArtworkRequest,
    ) -> Result<Vec<String>, SourceError> {
        let endpoint = endpoint(request.art_style);
        // The search result is the same at both tiers; resolve it once.
        let mut searched: Option<Option<i64>> = None;

        for dimensions in [
            request.art_style.hq_dimensions(),
            request.art_style.lq_dimensions(),
        ] {
            let filter = self.filter(dimensions);

            if !request.custom {
                let url = format!("{BASE_URL}/{endpoint}/steam/{}{filter}", request.game_id);
                if let Some(bytes) = self.get(&url).await? {
                    if let Some(found) = Self::parse_images(&url, &bytes)? {
                        return Ok(vec![found]);
                    }
                    // Listed but empty at this tier; drop to LQ.
                    continue;
                }
            }

            if request.game_name.is_empty() {
                return Ok(vec![]);
            }

            let game_id = match searched {
                Some(id) => id,
                None => {
                    let id = self.search_game_id(&request.game_name, &filter).await?;
                    searched = Some(id);
                    id
                }
            };
            let Some(game_id) = game_id else {
                debug!(game_name = %request.game_name, "no SteamGridDB search match");
                return Ok(vec![]);
            };

            let url = format!("{BASE_URL}/{endpoint}/game/{game_id}{filter}");
            if let Some(bytes) = self.get(&url).await? {
                if let Some(found) = Self::parse_images(&url, &bytes)? {
                    return Ok(vec![found]);
                }
            }
        }

        Ok(vec![])
    }
}

impl ArtSource for SteamGridDb {
    fn provenance(&self) -> Provenance {
        Provenance::SteamGridDb
    }

    fn applies(&self, request: &ArtworkRequest) -> bool {
        // A shortcut with no name has nothing to search by.
        !request.custom || !request.game_name.is_empty()
    }

    fn locate<'a>(&'a self, request: &'a ArtworkRequest) -> LocateFuture<'a> {
        Box::pin(self.locate_inner(request))
    }
}
