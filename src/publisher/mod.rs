//! Resilient upload of the report artifact to a WordPress-style media store.
//!
//! The store is unreliable in several independent ways, and each retry axis
//! answers one of them:
//!
//! | Failure | Countermeasure |
//! |---------|----------------|
//! | 30x redirect that drops the auth header | re-POST once to `Location` with the same credentials |
//! | URL rewriting breaks `/wp-json/...` | retry on the `?rest_route=` alias |
//! | leftover partial upload blocks the name | retry with a timestamped, randomized filename |
//! | upload accepted but response lacks the URL | recover it from the listing / search endpoints |
//!
//! Steps run in that order, cheapest first, so the worst case is 8 upload
//! requests plus the two verification lookups.

pub mod response;
pub mod transport;

use std::path::Path;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::PublishError;
use crate::models::{Provenance, PublishResult, UploadAttempt};
use crate::utils::{truncate_for_log, unique_filename};
use response::{extract_url, listing_entries, StoreResponse};
use transport::{Credentials, FileUpload, MediaTransport, RawResponse};

const DIAGNOSTIC_SNIPPET: usize = 500;

/// One URL presumed to reach the media-creation resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointVariant {
    pub label: String,
    pub url: Url,
}

impl EndpointVariant {
    pub fn new(label: &str, url: Url) -> Self {
        Self {
            label: label.to_string(),
            url,
        }
    }

    /// The REST path and its query-routed alias for a WordPress site.
    pub fn wordpress_variants(base_url: &str) -> Result<Vec<EndpointVariant>, PublishError> {
        let base = Url::parse(&format!("{}/", base_url.trim().trim_end_matches('/')))?;
        let rest = base.join("wp-json/wp/v2/media")?;
        let mut alias = base.clone();
        alias.set_query(Some("rest_route=/wp/v2/media"));
        Ok(vec![
            EndpointVariant::new("wp-json", rest),
            EndpointVariant::new("rest_route", alias),
        ])
    }
}

/// Content type sent with the multipart file part.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_str() {
        "md" => "text/markdown",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn stem_of(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

pub struct ResilientPublisher<T> {
    transport: T,
    listing_size: usize,
    timezone: Tz,
}

impl<T: MediaTransport> ResilientPublisher<T> {
    pub fn new(transport: T, listing_size: usize) -> Self {
        Self {
            transport,
            listing_size: listing_size.max(1),
            timezone: chrono_tz::Europe::Zurich,
        }
    }

    /// Timezone of the timestamp in retry filenames.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Upload `file_path` and resolve its public URL.
    ///
    /// # Errors
    ///
    /// [`PublishError::Exhausted`] once every upload variant and both
    /// verification lookups failed to produce a URL; it carries the last
    /// upload response body.
    #[instrument(level = "info", skip_all, fields(file = %file_path.display()))]
    pub async fn publish(
        &self,
        file_path: &Path,
        candidate_endpoints: &[EndpointVariant],
        credentials: &Credentials,
    ) -> Result<PublishResult, PublishError> {
        let Some(first_endpoint) = candidate_endpoints.first() else {
            return Err(PublishError::MissingCredentials("store endpoint"));
        };
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(PublishError::MissingCredentials("store credentials"));
        }

        let bytes = fs::read(file_path)
            .await
            .map_err(|source| PublishError::Artifact {
                path: file_path.display().to_string(),
                source,
            })?;
        let original = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "artifact".to_string());
        let extension = extension_of(&original);
        let stem = stem_of(&original);

        let mut upload = FileUpload {
            filename: original.clone(),
            content_type: content_type_for(&original).to_string(),
            bytes,
        };
        let mut attempts: Vec<UploadAttempt> = Vec::new();
        let mut last_endpoint = first_endpoint;

        'rounds: for round in 0..2 {
            if round == 1 {
                upload.filename =
                    unique_filename(&original, Utc::now().with_timezone(&self.timezone));
                info!(filename = %upload.filename, "Retrying with unique filename");
            }
            for endpoint in candidate_endpoints {
                let attempt = self.attempt(endpoint, &upload, credentials).await;
                last_endpoint = endpoint;
                let created = attempt.created();
                attempts.push(attempt);
                if created {
                    break 'rounds;
                }
            }
        }

        let last = attempts
            .last()
            .cloned()
            .ok_or(PublishError::MissingCredentials("store endpoint"))?;

        if last.status.is_some_and(|s| (200..300).contains(&s)) {
            if let Some(url) = extract_url(&StoreResponse::parse(&last.body)) {
                info!(%url, attempts = attempts.len(), "Upload resolved from response");
                return Ok(PublishResult {
                    url,
                    provenance: Provenance::UploadResponse,
                    attempts,
                });
            }
            warn!(
                body = %truncate_for_log(&last.body, 300),
                "Upload response carries no URL; verifying by listing"
            );
        } else {
            warn!(
                status = ?last.status,
                attempts = attempts.len(),
                "Upload not confirmed; verifying by listing"
            );
        }

        if let Some((url, provenance)) = self
            .verify_by_listing(last_endpoint, &stem, &extension, credentials)
            .await
        {
            info!(%url, ?provenance, "Upload URL recovered");
            return Ok(PublishResult {
                url,
                provenance,
                attempts,
            });
        }

        Err(PublishError::Exhausted {
            attempts: attempts.len(),
            last_body: truncate_for_log(&last.body, DIAGNOSTIC_SNIPPET),
        })
    }

    /// One upload, replayed once against a redirect target.
    async fn attempt(
        &self,
        endpoint: &EndpointVariant,
        upload: &FileUpload,
        credentials: &Credentials,
    ) -> UploadAttempt {
        let mut redirects = Vec::new();
        let mut result = self
            .transport
            .post_file(&endpoint.url, upload, credentials)
            .await;

        if let Some(target) = redirect_target(&endpoint.url, &result) {
            info!(endpoint = %endpoint.label, %target, "Replaying upload to redirect target");
            redirects.push(target.to_string());
            result = self.transport.post_file(&target, upload, credentials).await;
        }

        let (status, body) = match result {
            Ok(raw) => (Some(raw.status), raw.body),
            Err(e) => {
                warn!(endpoint = %endpoint.label, error = %e, "Upload request failed");
                (None, e.to_string())
            }
        };
        info!(
            endpoint = %endpoint.label,
            filename = %upload.filename,
            status = ?status,
            "Upload attempt finished"
        );

        UploadAttempt {
            endpoint: endpoint.label.clone(),
            filename: upload.filename.clone(),
            status,
            body,
            redirects,
        }
    }

    async fn fetch(
        &self,
        url: &Url,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Option<RawResponse> {
        let mut result = self.transport.get(url, query, credentials).await;
        if let Some(target) = redirect_target(url, &result) {
            result = self.transport.get(&target, query, credentials).await;
        }
        match result {
            Ok(raw) if raw.is_success() => Some(raw),
            Ok(raw) => {
                warn!(%url, status = raw.status, "Lookup rejected");
                None
            }
            Err(e) => {
                warn!(%url, error = %e, "Lookup failed");
                None
            }
        }
    }

    /// Look for the artifact among the newest items, then by name.
    async fn verify_by_listing(
        &self,
        endpoint: &EndpointVariant,
        stem: &str,
        extension: &str,
        credentials: &Credentials,
    ) -> Option<(String, Provenance)> {
        let per_page = self.listing_size.to_string();

        let recent = [
            ("per_page", per_page.clone()),
            ("orderby", "date".to_string()),
            ("order", "desc".to_string()),
        ];
        if let Some(raw) = self.fetch(&endpoint.url, &recent, credentials).await {
            // newest items may belong to anyone, so the name must match too
            if let Some(url) = pick_entry(&raw.body, Some(stem), extension) {
                return Some((url, Provenance::Listing));
            }
        }

        let search = [("search", stem.to_string()), ("per_page", per_page)];
        if let Some(raw) = self.fetch(&endpoint.url, &search, credentials).await {
            if let Some(url) = pick_entry(&raw.body, None, extension) {
                return Some((url, Provenance::Search));
            }
        }
        None
    }
}

fn redirect_target(base: &Url, result: &Result<RawResponse, PublishError>) -> Option<Url> {
    let raw = result.as_ref().ok().filter(|raw| raw.is_redirect())?;
    let location = raw.location.as_deref()?;
    base.join(location).ok()
}

/// First entry whose URL ends in `.{extension}` (and mentions `stem`, if given).
fn pick_entry(body: &str, stem: Option<&str>, extension: &str) -> Option<String> {
    let suffix = format!(".{extension}");
    let stem = stem.map(str::to_lowercase);
    listing_entries(body)
        .iter()
        .filter_map(extract_url)
        .find(|url| {
            let lower = url.to_lowercase();
            let path = lower.split(['?', '#']).next().unwrap_or_default();
            path.ends_with(&suffix) && stem.as_deref().is_none_or(|s| path.contains(s))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    const FILE: &str = "Daily_Investment_Report_2025-08-19.pdf";

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        url: String,
        filename: String,
    }

    /// Scripted store. Posts consume `uploads` in order (an empty script
    /// answers 500); listing and search bodies are fixed.
    #[derive(Default)]
    struct FakeStore {
        uploads: RefCell<VecDeque<Result<RawResponse, PublishError>>>,
        listing: Option<String>,
        search: Option<String>,
        posts: RefCell<Vec<Call>>,
        gets: RefCell<Vec<String>>,
    }

    impl FakeStore {
        fn with_uploads(uploads: Vec<Result<RawResponse, PublishError>>) -> Self {
            Self {
                uploads: RefCell::new(uploads.into()),
                ..Self::default()
            }
        }
    }

    impl MediaTransport for FakeStore {
        async fn post_file(
            &self,
            url: &Url,
            upload: &FileUpload,
            credentials: &Credentials,
        ) -> Result<RawResponse, PublishError> {
            assert_eq!(credentials.username, "bot");
            assert_eq!(upload.content_type, "application/pdf");
            self.posts.borrow_mut().push(Call {
                url: url.to_string(),
                filename: upload.filename.clone(),
            });
            self.uploads
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(status(500, "internal error")))
        }

        async fn get(
            &self,
            _url: &Url,
            query: &[(&str, String)],
            _credentials: &Credentials,
        ) -> Result<RawResponse, PublishError> {
            let is_search = query.iter().any(|(k, _)| *k == "search");
            self.gets
                .borrow_mut()
                .push(if is_search { "search" } else { "listing" }.to_string());
            let body = if is_search { &self.search } else { &self.listing };
            Ok(status(200, body.as_deref().unwrap_or("[]")))
        }
    }

    fn status(code: u16, body: &str) -> RawResponse {
        RawResponse {
            status: code,
            location: None,
            body: body.to_string(),
        }
    }

    fn redirect(code: u16, location: &str) -> RawResponse {
        RawResponse {
            status: code,
            location: Some(location.to_string()),
            body: String::new(),
        }
    }

    fn artifact() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE);
        std::fs::write(&path, b"%PDF-1.3\n").unwrap();
        (dir, path)
    }

    fn endpoints() -> Vec<EndpointVariant> {
        EndpointVariant::wordpress_variants("http://store.example.com").unwrap()
    }

    fn creds() -> Credentials {
        Credentials::new(Some("bot"), Some("app pass")).unwrap()
    }

    #[test]
    fn test_wordpress_variants() {
        let v = EndpointVariant::wordpress_variants("https://blog.example.com/site/").unwrap();
        assert_eq!(v[0].url.as_str(), "https://blog.example.com/site/wp-json/wp/v2/media");
        assert_eq!(
            v[1].url.as_str(),
            "https://blog.example.com/site/?rest_route=/wp/v2/media"
        );
        assert!(EndpointVariant::wordpress_variants("not a url").is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a.MD"), "text/markdown");
        assert_eq!(content_type_for("a.pdf"), "application/pdf");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }

    #[test]
    fn test_pick_entry() {
        let body = r#"[
            {"source_url": "https://s.example/uploads/other.md"},
            {"source_url": "https://s.example/uploads/Daily_Investment_Report_2025-08-19-1.pdf?ver=2"},
            {"source_url": "https://s.example/uploads/logo.png"}
        ]"#;
        assert_eq!(
            pick_entry(body, Some("Daily_Investment_Report_2025-08-19"), "pdf").as_deref(),
            Some("https://s.example/uploads/Daily_Investment_Report_2025-08-19-1.pdf?ver=2")
        );
        assert_eq!(
            pick_entry(body, None, "md").as_deref(),
            Some("https://s.example/uploads/other.md")
        );
        assert_eq!(pick_entry(body, Some("other"), "pdf"), None);
        assert_eq!(pick_entry(body, None, "docx"), None);
    }

    #[tokio::test]
    async fn test_direct_success() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![Ok(status(
            201,
            r#"{"id": 9, "source_url": "https://store.example.com/uploads/report.pdf"}"#,
        ))]);
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();

        assert_eq!(result.url, "https://store.example.com/uploads/report.pdf");
        assert_eq!(result.provenance, Provenance::UploadResponse);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(publisher.transport.posts.borrow()[0].filename, FILE);
    }

    #[tokio::test]
    async fn test_redirect_is_replayed_before_any_fallback() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![
            Ok(redirect(302, "https://store.example.com/wp-json/wp/v2/media")),
            Ok(status(201, r#"{"source_url": "https://store.example.com/uploads/r.pdf"}"#)),
        ]);
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();

        assert_eq!(result.url, "https://store.example.com/uploads/r.pdf");
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(
            result.attempts[0].redirects,
            vec!["https://store.example.com/wp-json/wp/v2/media"]
        );
        let posts = publisher.transport.posts.borrow();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "http://store.example.com/wp-json/wp/v2/media");
        assert_eq!(posts[1].url, "https://store.example.com/wp-json/wp/v2/media");
        assert_eq!(posts[1].filename, FILE);
        assert!(publisher.transport.gets.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_relative_redirect_resolves_against_endpoint() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![
            Ok(redirect(308, "/index.php/wp-json/wp/v2/media")),
            Ok(status(201, r#"{"source_url": "https://store.example.com/r.pdf"}"#)),
        ]);
        let publisher = ResilientPublisher::new(store, 5);
        publisher.publish(&path, &endpoints(), &creds()).await.unwrap();
        assert_eq!(
            publisher.transport.posts.borrow()[1].url,
            "http://store.example.com/index.php/wp-json/wp/v2/media"
        );
    }

    #[tokio::test]
    async fn test_list_of_one_with_guid_fallback() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![Ok(status(
            201,
            r#"[{"id": 11, "guid": {"rendered": "https://store.example.com/?attachment_id=11"}}]"#,
        ))]);
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();
        assert_eq!(result.url, "https://store.example.com/?attachment_id=11");
        assert_eq!(result.provenance, Provenance::UploadResponse);
    }

    #[tokio::test]
    async fn test_alternate_endpoint_after_failure() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![
            Ok(status(404, r#"{"code": "rest_no_route"}"#)),
            Ok(status(201, r#"{"source_url": "https://store.example.com/alt.pdf"}"#)),
        ]);
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();

        assert_eq!(result.url, "https://store.example.com/alt.pdf");
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[1].endpoint, "rest_route");
        assert_eq!(
            publisher.transport.posts.borrow()[1].url,
            "http://store.example.com/?rest_route=/wp/v2/media"
        );
    }

    #[tokio::test]
    async fn test_transport_error_counts_as_failed_attempt() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![
            Err(PublishError::Transport("operation timed out".to_string())),
            Ok(status(201, r#"{"source_url": "https://store.example.com/t.pdf"}"#)),
        ]);
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();
        assert_eq!(result.attempts[0].status, None);
        assert!(result.attempts[0].body.contains("timed out"));
        assert_eq!(result.url, "https://store.example.com/t.pdf");
    }

    #[tokio::test]
    async fn test_unique_name_round_then_listing_recovery() {
        let (_dir, path) = artifact();
        let mut store = FakeStore::default();
        store.listing = Some(
            r#"[{"source_url": "https://store.example.com/uploads/unrelated.pdf"},
                {"source_url": "https://store.example.com/uploads/Daily_Investment_Report_2025-08-19-20250819063000-ab12cd.pdf"}]"#
                .to_string(),
        );
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();

        assert_eq!(result.provenance, Provenance::Listing);
        assert!(result.url.ends_with("-ab12cd.pdf"));
        assert_eq!(result.attempts.len(), 4);

        let posts = publisher.transport.posts.borrow();
        assert_eq!(posts[0].filename, FILE);
        assert_eq!(posts[1].filename, FILE);
        assert_ne!(posts[2].filename, FILE);
        assert!(posts[2].filename.starts_with("Daily_Investment_Report_2025-08-19-"));
        assert!(posts[2].filename.ends_with(".pdf"));
        assert_eq!(posts[2].filename, posts[3].filename);
        assert_eq!(*publisher.transport.gets.borrow(), vec!["listing"]);
    }

    #[tokio::test]
    async fn test_accepted_without_url_recovered_by_search() {
        let (_dir, path) = artifact();
        let mut store = FakeStore::with_uploads(vec![Ok(status(201, r#"{"id": 12}"#))]);
        store.listing = Some(r#"[{"source_url": "https://store.example.com/uploads/someone-else.pdf"}]"#.to_string());
        store.search = Some(
            r#"[{"guid": {"rendered": "https://store.example.com/uploads/daily-investment-report.pdf"}}]"#
                .to_string(),
        );
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();

        assert_eq!(result.provenance, Provenance::Search);
        assert_eq!(result.url, "https://store.example.com/uploads/daily-investment-report.pdf");
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(*publisher.transport.gets.borrow(), vec!["listing", "search"]);
    }

    #[tokio::test]
    async fn test_exhausted_carries_last_body() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![
            Ok(status(500, "first")),
            Ok(status(502, "second")),
            Ok(status(500, "third")),
            Ok(status(200, "<html>maintenance mode</html>")),
        ]);
        let publisher = ResilientPublisher::new(store, 5);
        let err = publisher.publish(&path, &endpoints(), &creds()).await.unwrap_err();

        match err {
            PublishError::Exhausted { attempts, last_body } => {
                assert_eq!(attempts, 4);
                assert!(last_body.contains("maintenance mode"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(publisher.transport.posts.borrow().len(), 4);
        assert_eq!(*publisher.transport.gets.borrow(), vec!["listing", "search"]);
    }

    #[tokio::test]
    async fn test_missing_endpoint_or_credentials_fail_fast() {
        let (_dir, path) = artifact();
        let publisher = ResilientPublisher::new(FakeStore::default(), 5);
        assert!(matches!(
            publisher.publish(&path, &[], &creds()).await,
            Err(PublishError::MissingCredentials("store endpoint"))
        ));

        let blank = Credentials {
            username: String::new(),
            password: String::new(),
        };
        assert!(matches!(
            publisher.publish(&path, &endpoints(), &blank).await,
            Err(PublishError::MissingCredentials(_))
        ));
        assert!(publisher.transport.posts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let publisher = ResilientPublisher::new(FakeStore::default(), 5);
        let err = publisher
            .publish(Path::new("/nonexistent/report.pdf"), &endpoints(), &creds())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Artifact { .. }));
    }

    #[tokio::test]
    async fn test_redirect_is_replayed_only_once() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(vec![
            Ok(redirect(302, "https://store.example.com/wp-json/wp/v2/media")),
            Ok(redirect(302, "https://cdn.example.com/wp-json/wp/v2/media")),
            Ok(status(201, r#"{"source_url": "https://store.example.com/uploads/r.pdf"}"#)),
        ]);
        let publisher = ResilientPublisher::new(store, 5);
        let result = publisher.publish(&path, &endpoints(), &creds()).await.unwrap();

        assert_eq!(result.url, "https://store.example.com/uploads/r.pdf");
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].status, Some(302));
        assert_eq!(result.attempts[0].redirects.len(), 1);
        assert_eq!(result.attempts[1].endpoint, "rest_route");

        let posts = publisher.transport.posts.borrow();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].url, "http://store.example.com/wp-json/wp/v2/media");
        assert_eq!(posts[1].url, "https://store.example.com/wp-json/wp/v2/media");
        assert_eq!(posts[2].url, "http://store.example.com/?rest_route=/wp/v2/media");
    }

    #[tokio::test]
    async fn test_redirect_on_every_call_stays_within_budget() {
        let (_dir, path) = artifact();
        let store = FakeStore::with_uploads(
            (0..20)
                .map(|_| Ok(redirect(307, "/elsewhere/wp-json/wp/v2/media")))
                .collect(),
        );
        let publisher = ResilientPublisher::new(store, 5);
        let err = publisher.publish(&path, &endpoints(), &creds()).await.unwrap_err();

        assert!(matches!(err, PublishError::Exhausted { attempts: 4, .. }));
        assert_eq!(publisher.transport.posts.borrow().len(), 8);
        assert_eq!(*publisher.transport.gets.borrow(), vec!["listing", "search"]);
    }

    #[tokio::test]
    async fn test_unique_name_uses_configured_timezone() {
        let (_dir, path) = artifact();
        let publisher =
            ResilientPublisher::new(FakeStore::default(), 5).with_timezone(chrono_tz::Tz::UTC);
        let before = Utc::now().format("%Y%m%d%H").to_string();
        let _ = publisher.publish(&path, &endpoints(), &creds()).await;
        let after = Utc::now().format("%Y%m%d%H").to_string();

        let posts = publisher.transport.posts.borrow();
        let prefix = "Daily_Investment_Report_2025-08-19-";
        assert!(posts[2].filename.starts_with(prefix));
        let stamp = &posts[2].filename[prefix.len()..];
        assert!(stamp.starts_with(&before) || stamp.starts_with(&after));
    }
}
