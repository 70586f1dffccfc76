//! Turning deduplicated articles into report content.
//!
//! The model is asked for headlines, short summaries and affected company
//! names. Whatever it returns is validated defensively; every failure mode
//! ends in a well-formed [`Report`] rather than an error:
//!
//! | Situation | Result |
//! |-----------|--------|
//! | no articles | `no_news` placeholder headline |
//! | no LLM configured | `no_llm` placeholder, raw titles |
//! | API error or unusable JSON | `llm_error` placeholder, raw titles |

use std::fmt::Write;
use std::time::Instant;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::llm::{ChatAsync, RetryChat};
use crate::models::{Article, Report, ReportArticle};
use crate::utils::{looks_truncated, truncate_for_log};

const MAX_HEADLINES: usize = 5;

/// Default user prompt; `{articles}` and `{today}` are substituted.
pub const DEFAULT_PROMPT: &str = r#"Du bist Finanzjournalist. Erstelle Headline(s) und kurze Zusammenfassungen.

**Ausgangsartikel**
{articles}
**Aufgabe**
Für jeden Artikel:
- Formuliere eine prägnante **Überschrift** (max. 120 Zeichen).
- Verfasse eine **Summary in 2-3 Sätzen** (max. 350 Zeichen).
- Extrahiere betroffene Unternehmensnamen in normaler Schreibweise
  (z. B. «Novartis», «Sonova»). 0-n Einträge möglich.

**Rückgabe (JSON)**
{
  "headline": ["2-5 prägnante Schlagzeilen"],
  "articles": [
    {
      "title": "…",
      "summary": "…",
      "source": "… (Name wie oben)",
      "url": "… (Deep Link)",
      "date": "YYYY-MM-DD",
      "companies": ["…", "…"]
    }
  ]
}

Gib **nur** den JSON-Block zurück.
Datum heute: {today}
"#;

/// Prompt and placeholder headlines. Defaults are German, matching the
/// outlets and the search language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportTexts {
    pub prompt: String,
    pub no_news: String,
    pub no_llm: String,
    pub llm_error: String,
}

impl Default for ReportTexts {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            no_news: "(Keine News gefunden)".to_string(),
            no_llm: "(Ohne GPT-Zusammenfassungen)".to_string(),
            llm_error: "(OpenAI-Error)".to_string(),
        }
    }
}

impl Report {
    /// Headline-only report with the raw article data attached.
    pub fn placeholder(headline: &str, articles: &[Article]) -> Self {
        Self {
            headline: vec![headline.to_string()],
            articles: articles.iter().map(ReportArticle::from_article).collect(),
        }
    }

    /// Trim and de-duplicate model output so the renderer gets clean lists.
    fn tidy(mut self) -> Self {
        self.headline = self
            .headline
            .into_iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unique()
            .take(MAX_HEADLINES)
            .collect();
        for article in &mut self.articles {
            article.title = article.title.trim().to_string();
            article.summary = article.summary.trim().to_string();
            article.companies = std::mem::take(&mut article.companies)
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unique()
                .collect();
        }
        self
    }
}

/// Fill the prompt template with the article list and the run date.
pub fn build_prompt(template: &str, articles: &[Article], today: NaiveDate) -> String {
    let mut context = String::new();
    for a in articles {
        let _ = writeln!(
            context,
            "* {} | {} | {} | {}",
            a.source, a.title, a.url, a.published_date
        );
    }
    template
        .replace("{articles}", &context)
        .replace("{today}", &today.to_string())
}

/// Parse the model's reply into a report. Non-object JSON is rejected.
pub fn parse_report(raw: &str) -> Result<Report, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("top-level JSON value is not an object"));
    }
    serde_json::from_value(value)
}

/// Produces report content, with or without a model behind it.
pub struct Summarizer<T> {
    chat: Option<RetryChat<T>>,
    texts: ReportTexts,
}

impl<T: ChatAsync> Summarizer<T> {
    pub fn new(chat: Option<RetryChat<T>>, texts: ReportTexts) -> Self {
        Self { chat, texts }
    }

    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub async fn summarize(&self, articles: &[Article], today: NaiveDate) -> Report {
        if articles.is_empty() {
            info!("No articles found; using placeholder report");
            return Report::placeholder(&self.texts.no_news, &[]);
        }
        let Some(chat) = &self.chat else {
            warn!("No LLM configured; reporting raw titles");
            return Report::placeholder(&self.texts.no_llm, articles);
        };

        let t0 = Instant::now();
        let prompt = build_prompt(&self.texts.prompt, articles, today);
        debug!(bytes = prompt.len(), "Built prompt");

        let raw = match chat.ask(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "LLM call failed; reporting raw titles");
                return Report::placeholder(&self.texts.llm_error, articles);
            }
        };

        let mut parsed = parse_report(&raw);
        // a reply cut off by the token limit gets one more chance
        if let Err(ref e) = parsed {
            if looks_truncated(e) {
                warn!(error = %e, "EOF while parsing; re-asking once");
                match chat.ask(&prompt).await {
                    Ok(r2) => parsed = parse_report(&r2),
                    Err(e2) => warn!(error = %e2, "Re-ask failed"),
                }
            }
        }

        match parsed {
            Ok(report) => {
                let report = report.tidy();
                info!(
                    elapsed_ms = t0.elapsed().as_millis(),
                    headlines = report.headline.len(),
                    entries = report.articles.len(),
                    "Report content generated"
                );
                report
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&raw, 300),
                    "Model returned non-conforming JSON; reporting raw titles"
                );
                Report::placeholder(&self.texts.llm_error, articles)
            }
        }
    }
}
