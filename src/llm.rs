//! LLM API interaction with exponential backoff retry logic.
//!
//! - [`ChatAsync`]: core trait, one prompt in, raw model text out
//! - [`OpenAiChat`]: OpenAI-compatible `chat/completions` client in JSON mode
//! - [`RetryChat`]: decorator adding retries to any [`ChatAsync`]
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use rand::{rng, Rng};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::error::{ReportError, ReportResult};
use crate::utils::truncate_for_log;

/// Trait for async LLM interaction.
pub trait ChatAsync {
    /// Send `prompt` as the user message and return the model's reply text.
    async fn ask(&self, prompt: &str) -> ReportResult<String>;
}

/// Wrapper that adds exponential backoff retry logic to any [`ChatAsync`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryChat<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryChat<T>
where
    T: ChatAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryChat<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryChat")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> ChatAsync for RetryChat<T>
where
    T: ChatAsync,
{
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str) -> ReportResult<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(prompt).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat client that asks for a JSON object reply.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl OpenAiChat {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        system_prompt: &str,
        timeout: StdDuration,
    ) -> ReportResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
        })
    }
}

impl ChatAsync for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> ReportResult<String> {
        let t0 = Instant::now();
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.3,
            "max_tokens": 2000,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(
                elapsed_ms = t0.elapsed().as_millis(),
                status = status.as_u16(),
                "API call failed"
            );
            return Err(ReportError::LlmApi {
                status: status.as_u16(),
                message: truncate_for_log(&text, 300),
            });
        }

        let completion: ChatCompletion = serde_json::from_str(&text)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ReportError::ResponseShape("completion without content".to_string()))?;
        info!(elapsed_ms = t0.elapsed().as_millis(), bytes = content.len(), "API call succeeded");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Flaky {
        failures_left: Cell<usize>,
        calls: Cell<usize>,
    }

    impl ChatAsync for Flaky {
        async fn ask(&self, prompt: &str) -> ReportResult<String> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(ReportError::LlmApi {
                    status: 503,
                    message: "busy".to_string(),
                });
            }
            Ok(format!("echo: {prompt}"))
        }
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let flaky = Flaky {
            failures_left: Cell::new(2),
            calls: Cell::new(0),
        };
        let retry = RetryChat::new(flaky, 5, StdDuration::from_millis(10));
        let out = retry.ask("hi").await.unwrap();
        assert_eq!(out, "echo: hi");
        assert_eq!(retry.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let flaky = Flaky {
            failures_left: Cell::new(10),
            calls: Cell::new(0),
        };
        let retry = RetryChat::new(flaky, 2, StdDuration::from_millis(10));
        assert!(retry.ask("hi").await.is_err());
        assert_eq!(retry.inner.calls.get(), 3);
    }

    #[test]
    fn test_completion_parsing() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{\"headline\":[]}"}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(body).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("{\"headline\":[]}")
        );
    }

    #[test]
    fn test_retry_debug_hides_inner() {
        let flaky = Flaky {
            failures_left: Cell::new(0),
            calls: Cell::new(0),
        };
        let retry = RetryChat::new(flaky, 5, StdDuration::from_secs(1));
        assert!(format!("{retry:?}").contains("max_retries: 5"));
    }
}
