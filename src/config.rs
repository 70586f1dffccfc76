//! Runtime configuration.
//!
//! Everything has a default, so the binary runs without a config file. A YAML
//! file (`--config`) overrides any subset of fields; secrets and store
//! settings come from the CLI / environment on top of that.
//!
//! ```yaml
//! search:
//!   language: de
//!   per_query_limit: 3
//! preferred_hosts: [nzz.ch, fuw.ch]
//! window:
//!   kind: rolling
//!   days: 2
//! dedupe:
//!   mode: fuzzy
//!   threshold: 0.8
//! store:
//!   base_url: https://blog.example.com
//! timezone: Europe/Zurich
//! texts:
//!   no_news: "(No news found)"
//! ```

use std::ops::RangeInclusive;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cli::Cli;
use crate::error::{ReportError, ReportResult};
use crate::models::SourceQuery;
use crate::news::dedupe::MatchMode;
use crate::news::window::WindowPolicy;
use crate::report::ReportTexts;

/// Query template shared by the default outlets.
pub const DEFAULT_QUERY: &str = "site:{domain} Aktien Börse {after}";

const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("Bloomberg", "bloomberg.com"),
    ("Financial Times", "ft.com"),
    ("Reuters", "reuters.com"),
    ("Wall Street Journal", "wsj.com"),
    ("CNBC", "cnbc.com"),
    ("Nikkei Asia", "asia.nikkei.com"),
    ("Finanz und Wirtschaft", "fuw.ch"),
    ("NZZ", "nzz.ch"),
    ("Handelszeitung", "handelszeitung.ch"),
    ("AGEFI", "agefi.com"),
    ("finews.ch", "finews.ch"),
    ("cash.ch", "cash.ch"),
];

const WINDOW_DAYS: RangeInclusive<i64> = 1..=31;

const DEFAULT_PREFERRED_HOSTS: &[&str] = &[
    "nzz.ch",
    "fuw.ch",
    "handelszeitung.ch",
    "agefi.com",
    "finews.ch",
    "cash.ch",
];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub source_queries: Vec<SourceQuery>,
    pub preferred_hosts: Vec<String>,
    pub window: WindowPolicy,
    pub dedupe: MatchMode,
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub document: DocumentConfig,
    pub texts: ReportTexts,
    /// Zone that decides the run date and retry-filename timestamps.
    pub timezone: Tz,
    /// Timeout applied to every HTTP client.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            source_queries: DEFAULT_SOURCES
                .iter()
                .map(|(source, domain)| SourceQuery::new(source, domain, DEFAULT_QUERY))
                .collect(),
            preferred_hosts: DEFAULT_PREFERRED_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            window: WindowPolicy::default(),
            dedupe: MatchMode::default(),
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
            document: DocumentConfig::default(),
            texts: ReportTexts::default(),
            timezone: chrono_tz::Europe::Zurich,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// `hl` interface language sent to the search API.
    pub language: String,
    /// Hits requested per outlet query.
    pub per_query_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            language: "de".to_string(),
            per_query_limit: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub max_retries: usize,
    pub base_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: "Du bist ein präziser Finanzredakteur.".to_string(),
            max_retries: 5,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Site root; the media endpoints are derived from it.
    pub base_url: Option<String>,
    pub user: Option<String>,
    /// `per_page` for the verification listing and search.
    pub listing_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user: None,
            listing_size: 20,
        }
    }
}

/// Fixed text of the rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub title: String,
    pub logo_url: Option<String>,
    /// TrueType fonts for the PDF; Helvetica is used when missing.
    pub font_regular_url: Option<String>,
    pub font_bold_url: Option<String>,
    pub articles_heading: String,
    pub footer: String,
    /// Filename prefix; the run date and extension are appended.
    pub file_prefix: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: "Daily Investment Report".to_string(),
            logo_url: None,
            font_regular_url: None,
            font_bold_url: None,
            articles_heading: "Artikel".to_string(),
            footer: "© INVESTORY — Alle Angaben ohne Gewähr.".to_string(),
            file_prefix: "Daily_Investment_Report".to_string(),
        }
    }
}

impl Config {
    /// Defaults, overridden by the YAML file at `path` if one is given.
    ///
    /// A path that does not exist is an error, not a silent fallback.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub fn load(path: Option<&str>) -> ReportResult<Self> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        info!(
            sources = config.source_queries.len(),
            preferred = config.preferred_hosts.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> ReportResult<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer CLI / environment values over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = cli.store_base_url.as_ref().filter(|u| !u.is_empty()) {
            self.store.base_url = Some(url.clone());
        }
        if let Some(user) = cli.store_user.as_ref().filter(|u| !u.is_empty()) {
            self.store.user = Some(user.clone());
        }
        if let Some(logo) = cli.logo_url.as_ref().filter(|l| !l.is_empty()) {
            self.document.logo_url = Some(logo.clone());
        }
        if let Some(font) = cli.font_regular_url.as_ref().filter(|f| !f.is_empty()) {
            self.document.font_regular_url = Some(font.clone());
        }
        if let Some(font) = cli.font_bold_url.as_ref().filter(|f| !f.is_empty()) {
            self.document.font_bold_url = Some(font.clone());
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    fn validate(&self) -> ReportResult<()> {
        if let MatchMode::Fuzzy { threshold } = self.dedupe {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ReportError::Config(format!(
                    "dedupe threshold {threshold} outside [0, 1]"
                )));
            }
        }
        if self.search.per_query_limit == 0 {
            return Err(ReportError::Config(
                "search.per_query_limit must be at least 1".to_string(),
            ));
        }
        let days: Vec<(&str, i64)> = match &self.window {
            WindowPolicy::PriorBusinessDay {
                monday_lookback_days,
                lookback_days,
            } => vec![
                ("monday_lookback_days", *monday_lookback_days),
                ("lookback_days", *lookback_days),
            ],
            WindowPolicy::Rolling { days } => vec![("days", *days)],
        };
        if let Some((name, value)) = days.iter().find(|(_, d)| !WINDOW_DAYS.contains(d)) {
            return Err(ReportError::Config(format!(
                "window.{name} = {value} outside 1..=31"
            )));
        }
        if let Some(q) = self.source_queries.iter().find(|q| q.query.trim().is_empty()) {
            return Err(ReportError::Config(format!(
                "empty query template for source {}",
                q.source
            )));
        }
        Ok(())
    }
}
