use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use overgrid_backup::BackupStore;
use overgrid_model::{ArtStyle, ArtworkRequest, Provenance, RawArtwork};
use overgrid_overlay::{CompositorConfig, OverlaySet};
use overgrid_sources::{Resolution, Resolver};
use overgrid_steam::games::Game;
use overgrid_steam::paths::Paths;
use overgrid_steam::users::SteamUser;

use crate::report::{Report, Unit};
use crate::PipelineError;

/// Legacy BigPicture grid IDs: shortcut-style encoding of an app ID.
const BIG_PICTURE_FLAG: u64 = 0x0200_0000;

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Art styles to process, in order.
    pub styles: Vec<ArtStyle>,
    /// Directory with user-supplied replacement images.
    pub override_dir: Option<PathBuf>,
    pub compositor: CompositorConfig,
    /// Apply the WEBP-to-APNG conversion to banners and covers even when
    /// it is off globally.
    pub convert_webp_covers_banners: bool,
    /// Units processed at once.
    pub concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            styles: ArtStyle::all().to_vec(),
            override_dir: None,
            compositor: CompositorConfig::default(),
            convert_webp_covers_banners: false,
            concurrency: 4,
        }
    }
}

/// Processes every (game, art style) unit for one user and returns the
/// accumulated report. Unit failures are recorded, never fatal.
pub async fn run_user(
    paths: &Paths,
    user: &SteamUser,
    games: &[Game],
    resolver: Arc<Resolver>,
    overlays: Arc<OverlaySet>,
    config: &RunConfig,
) -> Result<Report, PipelineError> {
    paths.ensure_grid_dir(&user.id)?;
    let store = Arc::new(BackupStore::new(
        paths.grid_dir(&user.id),
        config.override_dir.clone(),
    ));

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let report = Arc::new(Mutex::new(Report::default()));
    let mut units = JoinSet::new();

    info!(user = %user.name, games = games.len(), "processing grid images");

    for game in games {
        for style in &config.styles {
            let request = ArtworkRequest {
                game_id: game.id.clone(),
                game_name: game.name.clone(),
                art_style: *style,
                tags: game.tags.clone(),
                custom: game.custom,
            };
            let resolver = resolver.clone();
            let overlays = overlays.clone();
            let store = store.clone();
            let report = report.clone();
            let semaphore = semaphore.clone();
            let mut compositor = config.compositor.clone();
            if config.convert_webp_covers_banners
                && matches!(*style, ArtStyle::Banner | ArtStyle::Cover)
            {
                compositor.convert_webp_to_apng = true;
            }

            units.spawn(async move {
                // Semaphore is never closed while the JoinSet is alive.
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                let outcome =
                    process_unit(&request, &resolver, &store, &overlays, &compositor).await;
                record(&report, &request, outcome);
            });
        }
    }

    while let Some(joined) = units.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "unit task panicked");
        }
    }

    let report = Arc::try_unwrap(report)
        .map_err(|_| PipelineError::Io("report still shared after join".into()))?
        .into_inner()
        .map_err(|_| PipelineError::Io("report lock poisoned".into()))?;
    Ok(report)
}

enum UnitOutcome {
    Done {
        provenance: Provenance,
        overlay_applied: bool,
    },
    NotFound,
    Failed(String),
    WriteFailed(String),
}

async fn process_unit(
    request: &ArtworkRequest,
    resolver: &Resolver,
    store: &BackupStore,
    overlays: &OverlaySet,
    compositor: &CompositorConfig,
) -> UnitOutcome {
    // Local files first: overrides, backups, manual customizations.
    let recovered = match store.recover(&request.game_id, request.art_style, &request.game_name)
    {
        Ok(recovered) => recovered,
        Err(e) => return UnitOutcome::Failed(e.to_string()),
    };

    let clean: RawArtwork = match recovered {
        Some(artwork) => {
            debug!(
                game_id = %request.game_id,
                style = %request.art_style,
                source = %artwork.provenance,
                "recovered local image"
            );
            artwork
        }
        None => match resolver.resolve(request).await {
            Ok(Resolution::Found(artwork)) => artwork,
            Ok(Resolution::NotFound) => return UnitOutcome::NotFound,
            Err(e) => return UnitOutcome::Failed(e.to_string()),
        },
    };

    let composite = match overgrid_overlay::decorate(
        &clean,
        request.art_style,
        &request.tags,
        overlays,
        compositor,
    ) {
        Ok(composite) => composite,
        Err(e) => return UnitOutcome::Failed(e.to_string()),
    };
    let overlay_applied = composite.is_some();
    let (decorated_bytes, decorated_ext) = match composite {
        Some(result) => (result.bytes, result.ext),
        None => (clean.bytes.clone(), clean.ext.clone()),
    };

    if let Err(e) = store.store(&request.game_id, request.art_style, &clean, &decorated_bytes) {
        return UnitOutcome::Failed(e.to_string());
    }
    if let Err(e) = store.purge_stale(
        &request.game_id,
        request.art_style,
        &[decorated_ext.as_str(), clean.ext.as_str()],
    ) {
        warn!(game_id = %request.game_id, error = %e, "failed to purge stale images");
    }

    let canonical = store.canonical_path(&request.game_id, request.art_style, &decorated_ext);
    if let Err(e) = fs::write(&canonical, &decorated_bytes) {
        return UnitOutcome::WriteFailed(e.to_string());
    }

    // BigPicture looks banners up under the legacy shortcut-style ID.
    if request.art_style == ArtStyle::Banner {
        if let Ok(id) = request.game_id.parse::<u64>() {
            let legacy = store
                .grid_dir()
                .join(format!("{}.{decorated_ext}", (id << 32) | BIG_PICTURE_FLAG));
            if let Err(e) = fs::write(&legacy, &decorated_bytes) {
                return UnitOutcome::WriteFailed(e.to_string());
            }
        }
    }

    UnitOutcome::Done {
        provenance: clean.provenance,
        overlay_applied,
    }
}

fn record(report: &Mutex<Report>, request: &ArtworkRequest, outcome: UnitOutcome) {
    let unit = Unit {
        game_id: request.game_id.clone(),
        game_name: request.game_name.clone(),
        style: request.art_style,
    };
    let mut report = match report.lock() {
        Ok(report) => report,
        Err(_) => return,
    };
    match outcome {
        UnitOutcome::Done {
            provenance,
            overlay_applied,
        } => {
            if overlay_applied {
                report.overlays_applied += 1;
            }
            if !provenance.is_local() {
                report.downloaded += 1;
            }
            match provenance {
                Provenance::SteamGridDb => report.from_steamgriddb.push(unit),
                Provenance::Igdb => report.from_igdb.push(unit),
                Provenance::Search => report.from_search.push(unit),
                _ => {}
            }
        }
        UnitOutcome::NotFound => report.not_found.push(unit),
        UnitOutcome::Failed(reason) => report.failed.push((unit, reason)),
        UnitOutcome::WriteFailed(reason) => report.write_failures.push((unit, reason)),
    }
}
