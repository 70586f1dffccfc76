//! JSON copy of the report content.
//!
//! Written next to the PDF so downstream jobs can reuse the
//! structured data without parsing the rendered page.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::ReportResult;
use crate::models::Report;

/// Write `report` as `{prefix}_{date}.json` into `output_dir`.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_report_json(
    report: &Report,
    date: NaiveDate,
    prefix: &str,
    output_dir: &str,
) -> ReportResult<PathBuf> {
    let json = serde_json::to_string_pretty(report)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = Path::new(output_dir).join(format!("{prefix}_{date}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote report JSON");
    Ok(path)
}
