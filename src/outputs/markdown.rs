//! Markdown rendering of the one-page report.
//!
//! Layout:
//! ```text
//! # Daily Investment Report
//! *19.08.2025*
//! ![logo](...)            (optional)
//! ---
//! - headline 1
//! - headline 2
//!
//! ## Articles
//! ### Title
//! [Source](url) — 18.08.25 – Summary (Company A, Company B)
//! ---
//! footer
//! ```

use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tracing::{info, instrument};

use crate::config::DocumentConfig;
use crate::error::ReportResult;
use crate::models::{Report, ReportArticle};

/// Name of the report document for a run date.
pub fn report_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{date}.md")
}

/// Render the report. An empty report still yields a complete document.
pub fn report_to_markdown(report: &Report, date: NaiveDate, doc: &DocumentConfig) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# {}\n", doc.title);
    let _ = writeln!(md, "*{}*\n", date.format("%d.%m.%Y"));
    if let Some(logo) = doc.logo_url.as_deref().filter(|l| !l.is_empty()) {
        let _ = writeln!(md, "![logo]({logo})\n");
    }
    md.push_str("---\n\n");

    for headline in &report.headline {
        let _ = writeln!(md, "- {}", escape(headline));
    }
    if !report.headline.is_empty() {
        md.push('\n');
    }

    if !report.articles.is_empty() {
        let _ = writeln!(md, "## {}\n", doc.articles_heading);
        for article in &report.articles {
            write_entry(&mut md, article);
        }
    }

    md.push_str("---\n\n");
    let _ = writeln!(md, "{}", doc.footer);
    md
}

fn write_entry(md: &mut String, article: &ReportArticle) {
    let title = if article.title.is_empty() {
        "(untitled)"
    } else {
        article.title.as_str()
    };
    let _ = writeln!(md, "### {}\n", escape(title));

    let source = if article.source.is_empty() {
        "Source"
    } else {
        article.source.as_str()
    };
    let mut line = if article.url.is_empty() {
        escape(source)
    } else {
        format!("[{}]({})", escape(source), article.url)
    };

    if let Some(date) = display_date(&article.date) {
        let _ = write!(line, " — {date}");
    }
    if !article.summary.is_empty() {
        let _ = write!(line, " – {}", escape(&article.summary));
    }
    if !article.companies.is_empty() {
        let _ = write!(line, " ({})", article.companies.join(", "));
    }
    let _ = writeln!(md, "{line}\n");
}

/// `2025-08-18` → `18.08.25`; anything unparsable is left out.
pub(crate) fn display_date(iso: &str) -> Option<String> {
    NaiveDate::parse_from_str(iso.get(..10)?, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d.%m.%y").to_string())
}

fn escape(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Write the rendered report into `output_dir` and return its path.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_report(
    report: &Report,
    date: NaiveDate,
    doc: &DocumentConfig,
    output_dir: &str,
) -> ReportResult<PathBuf> {
    let md = report_to_markdown(report, date, doc);
    let path = Path::new(output_dir).join(report_filename(&doc.file_prefix, date));
    fs::write(&path, md).await?;
    info!(path = %path.display(), "Wrote report document");
    Ok(path)
}
