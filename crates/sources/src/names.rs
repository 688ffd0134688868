//! Last-resort game name lookup.
//!
//! Steam's category file records app IDs only, and every name-driven
//! fallback (SteamGridDB autocomplete, IGDB, web search) skips a game
//! without a name. SteamDB publishes the display name per app ID.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::client::Fetcher;

const STEAMDB_URL: &str = "https://steamdb.info/app";

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<tr>\n<td>Name</td>\s*<td itemprop="name">(.*?)</td>"#).unwrap()
    })
}

/// Fetches the display name for an app ID, empty when unknown.
///
/// Failures are soft: a missing name only narrows the provider chain,
/// it never sinks the unit.
pub async fn lookup_game_name(fetcher: &dyn Fetcher, game_id: &str) -> String {
    let url = format!("{STEAMDB_URL}/{game_id}");
    let response = match fetcher.get(&url, &[]).await {
        Ok(response) => response,
        Err(e) => {
            debug!(game_id, error = %e, "name lookup request failed");
            return String::new();
        }
    };
    if response.status >= 400 {
        debug!(game_id, status = response.status, "name lookup rejected");
        return String::new();
    }

    let page = String::from_utf8_lossy(&response.bytes);
    match name_pattern().captures(&page) {
        Some(captures) => captures[1].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Canned, MockFetcher};

    const PAGE: &str = "<html><table><tr>\n<td>Name</td>\n\
                        <td itemprop=\"name\">Team Fortress 2</td></tr></table></html>";

    #[tokio::test]
    async fn extracts_name_from_app_page() {
        let fetcher = MockFetcher::default().with(
            "https://steamdb.info/app/440",
            Canned::ok("text/html", PAGE.as_bytes().to_vec()),
        );
        let name = lookup_game_name(&fetcher, "440").await;
        assert_eq!(name, "Team Fortress 2");
    }

    #[tokio::test]
    async fn missing_page_yields_empty_name() {
        let fetcher = MockFetcher::default();
        assert_eq!(lookup_game_name(&fetcher, "440").await, "");
    }

    #[tokio::test]
    async fn page_without_name_row_yields_empty_name() {
        let fetcher = MockFetcher::default().with(
            "https://steamdb.info/app/440",
            Canned::ok("text/html", b"<html>nothing here</html>".to_vec()),
        );
        assert_eq!(lookup_game_name(&fetcher, "440").await, "");
    }
}
