//! Last-resort web image search, banners only.
//!
//! Scrapes the regular Google image search page with an exact-size
//! filter. The two official image APIs are a dead end: one is deprecated
//! without size matching, the other needs an API key capped at 100
//! queries a day. Covers are excluded because the results are bad.

use std::sync::Arc;
use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use regex::Regex;
use tracing::debug;

use overgrid_model::{ArtStyle, ArtworkRequest, Provenance};

use crate::client::Fetcher;
use crate::resolver::{ArtSource, LocateFuture};
use crate::SourceError;

// Without a browser user agent Google blocks us as a bot; with an honest
// non-browser one it serves a stripped page without direct image links.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.3; WOW64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/39.0.2171.71 Safari/537.36";

pub struct WebSearch {
    fetcher: Arc<dyn Fetcher>,
}

impl WebSearch {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn search_url(name: &str, dimensions: (u32, u32)) -> String {
        let query = utf8_percent_encode(name, NON_ALPHANUMERIC);
        format!(
            "https://www.google.com.br/search?tbs=isz%3Aex%2Ciszw%3A{}%2Ciszh%3A{}&tbm=isch&num=5&q={query}",
            dimensions.0, dimensions.1
        )
    }

    /// The result markup has shipped in two shapes over time; try both.
    fn extract_image_url(page: &str) -> Option<String> {
        static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            [
                Regex::new(r#"imgurl=(.+?\.(jpeg|jpg|png))&amp;imgrefurl="#).unwrap(),
                Regex::new(r#""ou":"(.+?)","#).unwrap(),
            ]
        });
        patterns
            .iter()
            .find_map(|p| p.captures(page).map(|c| c[1].to_string()))
    }

    async fn locate_inner(
        &self,
        request: &ArtworkRequest,
    ) -> Result<Vec<String>, SourceError> {
        // Exact-size search at LQ; HQ banners are rare in the wild.
        let url = Self::search_url(&request.game_name, request.art_style.lq_dimensions());
        let headers = [("User-Agent", USER_AGENT.to_string())];
        let response = self.fetcher.get(&url, &headers).await?;
        if response.status >= 400 {
            debug!(status = response.status, "image search rejected the request");
            return Ok(vec![]);
        }
        let page = String::from_utf8_lossy(&response.bytes);
        Ok(Self::extract_image_url(&page).into_iter().collect())
    }
}

impl ArtSource for WebSearch {
    fn provenance(&self) -> Provenance {
        Provenance::Search
    }

    fn applies(&self, request: &ArtworkRequest) -> bool {
        request.art_style == ArtStyle::Banner && !request.game_name.is_empty()
    }

    fn locate<'a>(&'a self, request: &'a ArtworkRequest) -> LocateFuture<'a> {
        Box::pin(self.locate_inner(request))
    }
}
