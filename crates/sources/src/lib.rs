//! Multi-provider artwork resolution.
//!
//! Tries an ordered chain of providers (Steam CDN mirrors, SteamGridDB,
//! IGDB, web image search) and returns the first downloaded candidate
//! that passes the art style's aspect-ratio guard, tagged with its
//! provenance. A provider having no image is an expected soft miss; the
//! chain only stops early on hard errors.

pub mod client;
pub mod igdb;
pub mod names;
pub mod resolver;
pub mod steam_cdn;
pub mod steamgriddb;
pub mod websearch;

pub use client::{ClientConfig, Fetcher, HttpFetcher, HttpResponse};
pub use resolver::{ArtSource, Resolution, Resolver, ResolverConfig};

/// Errors from artwork resolution.
///
/// `AuthInvalid` is the circuit-breaker signal: the provider rejected our
/// credentials and should be disabled for the remainder of the run. All
/// other variants abort only the current game/art-style unit.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to download {url}: status {status}")]
    Status { url: String, status: u16 },

    #[error("authorization token is missing or invalid")]
    AuthInvalid,

    #[error("undecodable image from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("unexpected {provider} response: {reason}")]
    Api {
        provider: &'static str,
        reason: String,
    },
}
