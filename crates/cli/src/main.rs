use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::Parser;
use tracing::{info, warn};

use overgrid_model::ArtStyle;
use overgrid_overlay::CompositorConfig;
use overgrid_sources::igdb::Igdb;
use overgrid_sources::resolver::ArtSource;
use overgrid_sources::steam_cdn::SteamCdn;
use overgrid_sources::steamgriddb::{SteamGridDb, SteamGridDbConfig};
use overgrid_sources::websearch::WebSearch;
use overgrid_sources::{ClientConfig, HttpFetcher, Resolver, ResolverConfig};
use overgrid_steam::games::{collect_games, DiscoveryOptions};
use overgrid_steam::paths::{detect_install_dir, Paths};
use overgrid_steam::users::get_users;
use overgrid_pipeline::{run_user, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "overgrid", version)]
#[command(about = "Downloads and decorates Steam grid artwork for every local user")]
struct Cli {
    /// SteamGridDB API key (https://www.steamgriddb.com/profile/preferences).
    #[arg(long)]
    steamgriddb: Option<String>,

    /// IGDB API key (https://api.igdb.com/signup). Covers only.
    #[arg(long)]
    igdb: Option<String>,

    /// Steam installation directory; auto-detected when omitted.
    #[arg(long)]
    steamdir: Option<PathBuf>,

    /// Comma-separated SteamGridDB style filter.
    #[arg(long, default_value = "alternate")]
    styles: String,

    /// Comma-separated SteamGridDB type filter.
    #[arg(long, default_value = "static")]
    types: String,

    /// Skip downloads from the official Steam servers.
    #[arg(long, default_value_t = false)]
    skip_steam: bool,

    /// Skip the web image search fallback.
    #[arg(long, default_value_t = false)]
    skip_search: bool,

    /// Skip banner artwork.
    #[arg(long, default_value_t = false)]
    skip_banner: bool,

    /// Skip cover artwork.
    #[arg(long, default_value_t = false)]
    skip_cover: bool,

    /// Skip hero artwork.
    #[arg(long, default_value_t = false)]
    skip_hero: bool,

    /// Skip logo artwork.
    #[arg(long, default_value_t = false)]
    skip_logo: bool,

    /// Only process non-Steam shortcuts.
    #[arg(long, default_value_t = false)]
    non_steam_only: bool,

    /// Comma-separated app IDs to process instead of discovery.
    #[arg(long)]
    appids: Option<String>,

    /// Skip games whose artwork is available on the Steam servers.
    #[arg(long, default_value_t = false)]
    only_missing: bool,

    /// Directory with replacement images, named by app ID or game name.
    #[arg(long, default_value = "games")]
    overrides: PathBuf,

    /// Directory with category overlay images.
    #[arg(long, default_value = "overlays by category")]
    overlays: PathBuf,

    /// Convert animated WEBP artwork to APNG.
    #[arg(long, default_value_t = false)]
    webp_to_apng: bool,

    /// Convert animated WEBP to APNG for banners and covers only.
    #[arg(long, default_value_t = false)]
    webp_to_apng_covers_banners: bool,

    /// Decoded-frame memory budget for APNG conversion, in MiB (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    max_anim_memory: u64,

    /// Game/art-style units processed at once.
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
}

impl Cli {
    fn enabled_styles(&self) -> Vec<ArtStyle> {
        ArtStyle::all()
            .iter()
            .copied()
            .filter(|style| match style {
                ArtStyle::Banner => !self.skip_banner,
                ArtStyle::Cover => !self.skip_cover,
                ArtStyle::Hero => !self.skip_hero,
                ArtStyle::Logo => !self.skip_logo,
            })
            .collect()
    }

    fn build_resolver(&self) -> anyhow::Result<Resolver> {
        let fetcher = Arc::new(
            HttpFetcher::new(&ClientConfig::default()).context("failed to build HTTP client")?,
        );

        let mut sources: Vec<Box<dyn ArtSource>> = Vec::new();
        if !self.skip_steam {
            sources.push(Box::new(SteamCdn));
        }
        if let Some(key) = &self.steamgriddb {
            sources.push(Box::new(SteamGridDb::new(
                fetcher.clone(),
                SteamGridDbConfig {
                    api_key: key.clone(),
                    styles: self.styles.clone(),
                    types: self.types.clone(),
                },
            )));
        }
        if let Some(key) = &self.igdb {
            sources.push(Box::new(Igdb::new(fetcher.clone(), key.clone())));
        }
        if !self.skip_search {
            sources.push(Box::new(WebSearch::new(fetcher.clone())));
        }

        Ok(Resolver::new(
            fetcher,
            sources,
            ResolverConfig {
                only_missing: self.only_missing,
            },
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let styles = cli.enabled_styles();
    if styles.is_empty() {
        bail!("every art style is skipped, nothing to do");
    }

    let base_dir = detect_install_dir(cli.steamdir.as_deref())
        .context("could not find a Steam installation; pass --steamdir")?;
    info!(dir = %base_dir.display(), "using Steam installation");
    let paths = Paths::with_base(base_dir);

    let users = get_users(&paths)?;
    if users.is_empty() {
        bail!("no users found under Steam/userdata; has Steam been used on this machine?");
    }

    let overlays = Arc::new(overgrid_overlay::load_overlays(&cli.overlays)?);
    if overlays.is_empty() {
        info!(
            dir = %cli.overlays.display(),
            "no category overlays found, continuing without decoration"
        );
    } else {
        info!(count = overlays.len(), "loaded category overlays");
    }

    let resolver = Arc::new(cli.build_resolver()?);

    let discovery = DiscoveryOptions {
        non_steam_only: cli.non_steam_only,
        app_ids: cli
            .appids
            .as_deref()
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
    };

    let config = RunConfig {
        styles,
        override_dir: Some(cli.overrides.clone()),
        compositor: CompositorConfig {
            convert_webp_to_apng: cli.webp_to_apng,
            max_animation_bytes: cli.max_anim_memory * 1024 * 1024,
        },
        convert_webp_covers_banners: cli.webp_to_apng_covers_banners,
        concurrency: cli.concurrency,
    };

    for user in &users {
        info!(user = %user.name, "processing user");
        let games = collect_games(&paths, user, &discovery)?;
        if games.is_empty() {
            warn!(user = %user.name, "no games found, skipping");
            continue;
        }

        let report = run_user(&paths, user, &games, resolver.clone(), overlays.clone(), &config)
            .await?;
        println!("== {} ==", user.name);
        println!("{report}");
    }

    for provider in resolver.auth_invalidated() {
        warn!(%provider, "API key was rejected; those downloads were skipped");
    }

    println!("Open Steam in grid view to see the results!");
    Ok(())
}
