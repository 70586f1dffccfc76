//! News search collaborator.
//!
//! [`NewsSearch`] is the seam the aggregator talks to; [`SerpApiSearch`]
//! queries Google News through SerpAPI. The aggregator treats any error from
//! this layer as "no results for this query".

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{ReportError, ReportResult};
use crate::models::RawHit;
use crate::news::window::ArticleWindow;
use crate::utils::truncate_for_log;

pub const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

/// A search backend returning raw hits for a query.
pub trait NewsSearch {
    async fn search(
        &self,
        query: &str,
        window: &ArticleWindow,
        limit: usize,
    ) -> ReportResult<Vec<RawHit>>;
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    news_results: Vec<RawHit>,
    #[serde(default)]
    error: Option<String>,
}

/// Google News via SerpAPI.
#[derive(Debug, Clone)]
pub struct SerpApiSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    language: String,
}

impl SerpApiSearch {
    pub fn new(api_key: Option<String>, language: &str, timeout: Duration) -> ReportResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: SERPAPI_ENDPOINT.to_string(),
            api_key,
            language: language.to_string(),
        })
    }
}

impl NewsSearch for SerpApiSearch {
    #[instrument(level = "info", skip_all, fields(%query))]
    async fn search(
        &self,
        query: &str,
        window: &ArticleWindow,
        limit: usize,
    ) -> ReportResult<Vec<RawHit>> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No search API key configured; returning no results");
            return Ok(Vec::new());
        };

        let params = [
            ("engine", "google_news".to_string()),
            ("q", query.to_string()),
            ("hl", self.language.clone()),
            ("num", limit.to_string()),
            ("after", window.after.to_string()),
            ("before", window.before.to_string()),
            ("sort_by", "date".to_string()),
            ("api_key", api_key.to_string()),
        ];

        let response = self.client.get(&self.endpoint).query(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ReportError::SearchApi {
                status: status.as_u16(),
                message: truncate_for_log(&body, 300),
            });
        }

        let parsed: SerpApiResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error {
            // SerpAPI reports "no results" as an error string with status 200
            debug!(%error, "Search API returned an error message");
            return Ok(Vec::new());
        }

        let mut hits = parsed.news_results;
        hits.truncate(limit);
        debug!(count = hits.len(), "Search returned hits");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_missing_key_yields_empty() {
        let search = SerpApiSearch::new(None, "de", Duration::from_secs(1)).unwrap();
        let window = ArticleWindow::new(
            NaiveDate::from_ymd_opt(2025, 8, 18).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 19).unwrap(),
        );
        let hits = search.search("site:nzz.ch Aktien", &window, 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "search_metadata": {"status": "Success"},
            "news_results": [
                {"title": "SMI im Plus", "link": "https://www.nzz.ch/a", "source": {"name": "NZZ"}, "date": "08/18/2025, 07:00 AM, +0000 UTC"},
                {"title": "Ohne Link"}
            ]
        }"#;
        let parsed: SerpApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.news_results.len(), 2);
        assert_eq!(parsed.news_results[0].source.as_deref(), Some("NZZ"));
        assert!(parsed.news_results[1].link.is_empty());
        assert!(parsed.error.is_none());
    }

    #[test]
    fn test_error_response_parsing() {
        let parsed: SerpApiResponse =
            serde_json::from_str(r#"{"error": "Google hasn't returned any results for this query."}"#)
                .unwrap();
        assert!(parsed.news_results.is_empty());
        assert!(parsed.error.is_some());
    }
}
