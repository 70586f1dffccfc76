//! Normalized view of media-store responses and URL extraction.
//!
//! The store answers with an object, a list holding the object, or
//! something that is not JSON at all. Bodies are normalized once; URL
//! extraction is an ordered list of pure strategies and the first hit wins.

use serde_json::{Map, Value};

use crate::utils::truncate_for_log;

const OPAQUE_SNIPPET: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreResponse {
    Object(Map<String, Value>),
    /// Unparsable or unexpected body, truncated for diagnostics.
    Opaque(String),
}

impl StoreResponse {
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => StoreResponse::Object(map),
            Ok(Value::Array(items)) => match items.into_iter().next() {
                Some(Value::Object(map)) => StoreResponse::Object(map),
                _ => StoreResponse::Opaque(truncate_for_log(body, OPAQUE_SNIPPET)),
            },
            _ => StoreResponse::Opaque(truncate_for_log(body, OPAQUE_SNIPPET)),
        }
    }

    fn object(&self) -> Option<&Map<String, Value>> {
        match self {
            StoreResponse::Object(map) => Some(map),
            StoreResponse::Opaque(_) => None,
        }
    }
}

pub type UrlStrategy = fn(&StoreResponse) -> Option<String>;

/// Extraction order: direct source URL, then the rendered GUID.
pub const URL_STRATEGIES: &[UrlStrategy] = &[source_url, guid_rendered];

pub fn extract_url(response: &StoreResponse) -> Option<String> {
    URL_STRATEGIES.iter().find_map(|strategy| strategy(response))
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn source_url(response: &StoreResponse) -> Option<String> {
    non_empty(response.object()?.get("source_url"))
}

fn guid_rendered(response: &StoreResponse) -> Option<String> {
    non_empty(response.object()?.get("guid")?.get("rendered"))
}

/// All object entries of a listing or search response.
pub fn listing_entries(body: &str) -> Vec<StoreResponse> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(StoreResponse::Object(map)),
                _ => None,
            })
            .collect(),
        Ok(Value::Object(map)) => vec![StoreResponse::Object(map)],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object() {
        let r = StoreResponse::parse(r#"{"id": 7, "source_url": "https://s.example/a.md"}"#);
        assert_eq!(extract_url(&r).as_deref(), Some("https://s.example/a.md"));
    }

    #[test]
    fn test_parse_list_takes_first_element() {
        let r = StoreResponse::parse(
            r#"[{"guid": {"rendered": "https://s.example/?attachment_id=7"}}, {"source_url": "https://s.example/other.md"}]"#,
        );
        assert_eq!(
            extract_url(&r).as_deref(),
            Some("https://s.example/?attachment_id=7")
        );
    }

    #[test]
    fn test_source_url_preferred_over_guid() {
        let r = StoreResponse::parse(
            r#"{"guid": {"rendered": "https://s.example/guid"}, "source_url": "https://s.example/direct.md"}"#,
        );
        assert_eq!(extract_url(&r).as_deref(), Some("https://s.example/direct.md"));
    }

    #[test]
    fn test_empty_fields_fall_through() {
        let r = StoreResponse::parse(r#"{"source_url": "", "guid": {"rendered": " "}}"#);
        assert_eq!(extract_url(&r), None);
    }

    #[test]
    fn test_opaque_bodies() {
        let html = "<html>".to_string() + &"x".repeat(1000);
        match StoreResponse::parse(&html) {
            StoreResponse::Opaque(snippet) => assert!(snippet.contains("…(+")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(StoreResponse::parse("[]"), StoreResponse::Opaque(_)));
        assert!(matches!(StoreResponse::parse("[1]"), StoreResponse::Opaque(_)));
        assert_eq!(extract_url(&StoreResponse::parse("null")), None);
    }

    #[test]
    fn test_listing_entries() {
        let entries = listing_entries(r#"[{"source_url": "a"}, 3, {"source_url": "b"}]"#);
        assert_eq!(entries.len(), 2);
        assert_eq!(listing_entries(r#"{"source_url": "a"}"#).len(), 1);
        assert!(listing_entries("oops").is_empty());
    }
}
