//! Data models shared across the pipeline.
//!
//! - [`RawHit`]: one unprocessed result from the news search API
//! - [`SourceQuery`]: an outlet-scoped search query
//! - [`Article`]: a normalized, dated news hit ready for deduplication
//! - [`Report`] / [`ReportArticle`]: the structured content handed to the renderer
//! - [`UploadAttempt`] / [`PublishResult`]: bookkeeping of the publish protocol

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// A raw search result as returned by the search collaborator.
///
/// Only `title` and `link` are guaranteed; everything else depends on the
/// outlet and on what the search engine managed to extract.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, deserialize_with = "source_label")]
    pub source: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub iso_date: Option<String>,
}

/// SerpAPI reports `source` either as a plain string or as `{ "name": ... }`.
fn source_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Object(map)) => map
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string),
        _ => None,
    })
}

/// One outlet-scoped query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceQuery {
    /// Display name of the outlet, e.g. "NZZ".
    pub source: String,
    /// Host the query is scoped to, e.g. "nzz.ch".
    pub domain: String,
    /// Query template; `{domain}`, `{after}` and `{before}` are substituted.
    pub query: String,
}

impl SourceQuery {
    pub fn new(source: &str, domain: &str, query: &str) -> Self {
        Self {
            source: source.to_string(),
            domain: domain.to_string(),
            query: query.to_string(),
        }
    }

    /// Expand the query template for a concrete window.
    pub fn render(&self, after: NaiveDate, before: NaiveDate) -> String {
        self.query
            .replace("{domain}", &self.domain)
            .replace("{after}", &after.to_string())
            .replace("{before}", &before.to_string())
    }
}

/// A dated news article retained past the fetch stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_date: NaiveDate,
    pub hostname: String,
}

impl Article {
    pub fn new(title: &str, url: &str, source: &str, published_date: NaiveDate) -> Self {
        Self {
            title: title.trim().to_string(),
            url: url.to_string(),
            source: source.to_string(),
            published_date,
            hostname: hostname_of(url).unwrap_or_default(),
        }
    }
}

/// Lower-cased host of `url` with a leading `www.` removed.
pub fn hostname_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Structured report content, as produced by the LLM or by a fallback.
///
/// Missing top-level keys deserialize to empty containers so a partially
/// conforming model answer still renders.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Report {
    #[serde(default)]
    pub headline: Vec<String>,
    #[serde(default)]
    pub articles: Vec<ReportArticle>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReportArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    /// ISO date (`YYYY-MM-DD`) or empty.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub companies: Vec<String>,
}

impl ReportArticle {
    /// An entry carrying only the raw article data, no summary.
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            summary: String::new(),
            source: article.source.clone(),
            url: article.url.clone(),
            date: article.published_date.to_string(),
            companies: Vec::new(),
        }
    }
}

/// One HTTP attempt against the media store.
#[derive(Debug, Clone)]
pub struct UploadAttempt {
    /// Label of the endpoint variant that was targeted.
    pub endpoint: String,
    pub filename: String,
    /// `None` when the request never produced a response (timeout, connect error).
    pub status: Option<u16>,
    pub body: String,
    /// Locations re-posted to after a redirect.
    pub redirects: Vec<String>,
}

impl UploadAttempt {
    pub fn created(&self) -> bool {
        self.status == Some(201)
    }
}

/// Where the public URL of an uploaded artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    UploadResponse,
    Listing,
    Search,
}

#[derive(Debug, Clone)]
pub struct PublishResult {
    pub url: String,
    pub provenance: Provenance,
    pub attempts: Vec<UploadAttempt>,
}
