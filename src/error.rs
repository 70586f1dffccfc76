//! Error types for the report pipeline.
//!
//! Collaborator failures that the pipeline recovers from (a single search
//! query failing, the LLM returning garbage) are logged and absorbed where
//! they happen. Only configuration problems and an exhausted publish protocol
//! surface as errors to `main`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error (status {status}): {message}")]
    SearchApi { status: u16, message: String },

    #[error("LLM API error (status {status}): {message}")]
    LlmApi { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Failures of the resilient publish protocol.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Store credentials missing: {0}")]
    MissingCredentials(&'static str),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    #[error("Cannot read artifact {path}: {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upload failed after {attempts} attempts and verification; last response: {last_body}")]
    Exhausted { attempts: usize, last_body: String },
}

impl From<url::ParseError> for PublishError {
    fn from(err: url::ParseError) -> Self {
        PublishError::InvalidUrl(err.to_string())
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
