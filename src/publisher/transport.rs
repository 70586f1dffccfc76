//! HTTP plumbing for the media store.
//!
//! [`MediaTransport`] is deliberately dumb: one request, one response,
//! redirects never followed. Deciding what to do with a redirect or a bad
//! status is the publisher's job.

use std::fmt;
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use crate::error::PublishError;

/// Basic-auth credentials for the store (user + application password).
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Result<Self, PublishError> {
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(PublishError::MissingCredentials("store user"))?;
        let password = password
            .filter(|p| !p.trim().is_empty())
            .ok_or(PublishError::MissingCredentials("store application password"))?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The file being uploaded. The bytes are kept so a request can be replayed.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 307 | 308)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait MediaTransport {
    /// POST `upload` as `multipart/form-data` with basic auth.
    async fn post_file(
        &self,
        url: &Url,
        upload: &FileUpload,
        credentials: &Credentials,
    ) -> Result<RawResponse, PublishError>;

    /// GET `url` with extra query parameters and basic auth.
    async fn get(
        &self,
        url: &Url,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<RawResponse, PublishError>;
}

/// reqwest-backed transport; every call is bounded by the client timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, PublishError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { client })
    }
}

fn transport_error(e: reqwest::Error) -> PublishError {
    PublishError::Transport(e.to_string())
}

async fn into_raw(response: Response) -> Result<RawResponse, PublishError> {
    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.map_err(transport_error)?;
    Ok(RawResponse {
        status,
        location,
        body,
    })
}

impl MediaTransport for HttpTransport {
    #[instrument(level = "info", skip_all, fields(%url, filename = %upload.filename))]
    async fn post_file(
        &self,
        url: &Url,
        upload: &FileUpload,
        credentials: &Credentials,
    ) -> Result<RawResponse, PublishError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(transport_error)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url.clone())
            .basic_auth(&credentials.username, Some(&credentials.password))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let raw = into_raw(response).await?;
        debug!(status = raw.status, "Upload response");
        Ok(raw)
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn get(
        &self,
        url: &Url,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<RawResponse, PublishError> {
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(transport_error)?;
        let raw = into_raw(response).await?;
        debug!(status = raw.status, "Listing response");
        Ok(raw)
    }
}
