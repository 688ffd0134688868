//! The provider chain.
//!
//! Providers are consulted in order; each one names candidate URLs and
//! the resolver downloads and vets them. A provider with nothing to
//! offer is an expected miss and the chain moves on. A provider whose
//! credentials are rejected is disabled for the rest of the run without
//! sinking the current game.

use std::collections::HashMap;
use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use overgrid_model::{ArtStyle, ArtworkRequest, Provenance, RawArtwork};

use crate::client::{self, Download, Fetcher};
use crate::{names, SourceError};

pub type LocateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<String>, SourceError>> + Send + 'a>>;

/// One artwork provider in the chain.
pub trait ArtSource: Send + Sync {
    fn provenance(&self) -> Provenance;

    /// Whether this provider can serve the request at all.
    fn applies(&self, request: &ArtworkRequest) -> bool;

    /// Candidate download URLs, best first. Empty is a normal miss.
    fn locate<'a>(&'a self, request: &'a ArtworkRequest) -> LocateFuture<'a>;
}

#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Treat games with official CDN artwork as already covered.
    pub only_missing: bool,
}

struct ProviderSlot {
    source: Box<dyn ArtSource>,
    disabled: AtomicBool,
}

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(RawArtwork),
    NotFound,
}

pub struct Resolver {
    fetcher: Arc<dyn Fetcher>,
    slots: Vec<ProviderSlot>,
    config: ResolverConfig,
    /// Looked-up names per game ID, misses included, so a game's units
    /// share one lookup.
    names: Mutex<HashMap<String, String>>,
}

impl Resolver {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        sources: Vec<Box<dyn ArtSource>>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            fetcher,
            slots: sources
                .into_iter()
                .map(|source| ProviderSlot {
                    source,
                    disabled: AtomicBool::new(false),
                })
                .collect(),
            config,
            names: Mutex::new(HashMap::new()),
        }
    }

    /// Providers disabled by rejected credentials, for the final report.
    pub fn auth_invalidated(&self) -> Vec<Provenance> {
        self.slots
            .iter()
            .filter(|slot| slot.disabled.load(Ordering::Relaxed))
            .map(|slot| slot.source.provenance())
            .collect()
    }

    /// Walks the chain and returns the first candidate that downloads and
    /// passes the aspect guard.
    ///
    /// Steam games discovered from local files carry no name; one is
    /// looked up here so the name-driven providers still apply.
    pub async fn resolve(
        &self,
        request: &ArtworkRequest,
    ) -> Result<Resolution, SourceError> {
        if request.game_name.is_empty() && !request.custom {
            let mut named = request.clone();
            named.game_name = self.game_name(&request.game_id).await;
            return self.resolve_named(&named).await;
        }
        self.resolve_named(request).await
    }

    async fn game_name(&self, game_id: &str) -> String {
        if let Ok(cache) = self.names.lock() {
            if let Some(name) = cache.get(game_id) {
                return name.clone();
            }
        }
        let name = names::lookup_game_name(self.fetcher.as_ref(), game_id).await;
        if !name.is_empty() {
            debug!(game_id, name = %name, "resolved game name");
        }
        if let Ok(mut cache) = self.names.lock() {
            cache.insert(game_id.to_string(), name.clone());
        }
        name
    }

    async fn resolve_named(
        &self,
        request: &ArtworkRequest,
    ) -> Result<Resolution, SourceError> {
        for slot in &self.slots {
            if slot.disabled.load(Ordering::Relaxed) {
                continue;
            }
            if !slot.source.applies(request) {
                continue;
            }
            let provenance = slot.source.provenance();

            let urls = match slot.source.locate(request).await {
                Ok(urls) => urls,
                Err(SourceError::AuthInvalid) => {
                    slot.disabled.store(true, Ordering::Relaxed);
                    warn!(
                        provider = %provenance,
                        "credentials rejected, provider disabled for this run"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            for url in urls {
                let Some(download) = client::try_download(self.fetcher.as_ref(), &url).await?
                else {
                    continue;
                };

                if provenance == Provenance::SteamServer && self.config.only_missing {
                    // Official art exists; in only-missing mode that
                    // means there is nothing for us to do.
                    debug!(game_id = %request.game_id, "official artwork present, skipping");
                    return Ok(Resolution::NotFound);
                }

                if !aspect_matches(request.art_style, &download)? {
                    debug!(
                        game_id = %request.game_id,
                        style = %request.art_style,
                        url = %download.url,
                        "candidate has the wrong orientation"
                    );
                    continue;
                }

                info!(
                    game_id = %request.game_id,
                    style = %request.art_style,
                    provider = %provenance,
                    "artwork resolved"
                );
                return Ok(Resolution::Found(RawArtwork {
                    bytes: download.bytes,
                    ext: download.ext,
                    provenance,
                }));
            }
        }

        Ok(Resolution::NotFound)
    }
}

/// Checks the style's orientation guard against the image header.
///
/// Bytes that don't decode at all are a hard error: the download is
/// corrupt and silently skipping it would hide a real problem.
fn aspect_matches(style: ArtStyle, download: &Download) -> Result<bool, SourceError> {
    let reader = image::ImageReader::new(Cursor::new(&download.bytes))
        .with_guessed_format()
        .map_err(|e| SourceError::Decode {
            url: download.url.clone(),
            reason: e.to_string(),
        })?;
    let (width, height) = reader.into_dimensions().map_err(|e| SourceError::Decode {
        url: download.url.clone(),
        reason: e.to_string(),
    })?;
    Ok(style.aspect_ok(width, height))
}
