//! HTTP plumbing shared by all providers.
//!
//! The `Fetcher` trait is the seam between provider logic and the wire:
//! providers see plain status/bytes responses and apply their own error
//! taxonomy, and tests swap in canned responses.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use overgrid_model::ext;

use crate::SourceError;

/// A plain HTTP response, status included (no status is auto-fatal here).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Path of the final URL after redirects, for extension sniffing.
    pub url_path: String,
    pub bytes: Vec<u8>,
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, SourceError>> + Send + 'a>>;

/// Abstract HTTP transport.
pub trait Fetcher: Send + Sync {
    fn get<'a>(&'a self, url: &'a str, headers: &'a [(&'static str, String)]) -> FetchFuture<'a>;

    fn post<'a>(
        &'a self,
        url: &'a str,
        body: String,
        headers: &'a [(&'static str, String)],
    ) -> FetchFuture<'a>;
}

/// Transport timeouts, threaded in at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    /// Read timeout: cancels a stalled connection without cutting off a
    /// body transfer that is still making progress.
    pub response_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            response_timeout: Duration::from_secs(10),
        }
    }
}

/// `Fetcher` backed by a shared reqwest client/connection pool.
pub struct HttpFetcher {
    inner: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, SourceError> {
        let inner = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.response_timeout)
            .build()?;
        Ok(Self { inner })
    }

    async fn run(&self, builder: reqwest::RequestBuilder) -> Result<HttpResponse, SourceError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let url_path = response.url().path().to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(HttpResponse {
            status,
            content_type,
            url_path,
            bytes,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn get<'a>(&'a self, url: &'a str, headers: &'a [(&'static str, String)]) -> FetchFuture<'a> {
        Box::pin(async move {
            let mut builder = self.inner.get(url);
            for (name, value) in headers {
                builder = builder.header(*name, value);
            }
            self.run(builder).await
        })
    }

    fn post<'a>(
        &'a self,
        url: &'a str,
        body: String,
        headers: &'a [(&'static str, String)],
    ) -> FetchFuture<'a> {
        Box::pin(async move {
            let mut builder = self.inner.post(url).body(body);
            for (name, value) in headers {
                builder = builder.header(*name, value);
            }
            self.run(builder).await
        })
    }
}

/// A successfully downloaded candidate image.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    /// Extension without the leading dot, after normalization.
    pub ext: String,
    pub url: String,
}

/// Fetches a URL, applying the shared download taxonomy.
///
/// 404 is a soft miss (`Ok(None)`); any other client/server error status
/// is a hard error for the current unit.
pub async fn try_download(
    fetcher: &dyn Fetcher,
    url: &str,
) -> Result<Option<Download>, SourceError> {
    let response = fetcher.get(url, &[]).await?;

    if response.status == 404 {
        return Ok(None);
    }
    if response.status >= 400 {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    let ext = ext::extension_from(response.content_type.as_deref(), &response.url_path);
    Ok(Some(Download {
        bytes: response.bytes,
        ext,
        url: url.to_string(),
    }))
}
