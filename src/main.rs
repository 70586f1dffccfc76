//! # Daily Report
//!
//! A daily investment news report: fetches the previous business day's
//! financial headlines from a fixed set of outlets, collapses duplicate
//! stories (domestic press wins), has an LLM write headlines and short
//! summaries, renders a one-page PDF and optionally uploads it to a
//! WordPress media store.
//!
//! ## Usage
//!
//! ```sh
//! daily_report -o ./out --publish
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one search query per outlet, restricted to the report window
//! 2. **Deduplication**: near-identical titles collapse to one article
//! 3. **Summarizing**: one LLM call for the whole article list
//! 4. **Output**: PDF document, plus Markdown and JSON copies
//! 5. **Publishing**: resilient upload with redirect replay, endpoint and
//!    filename fallbacks, and verification by listing

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod llm;
mod models;
mod news;
mod outputs;
mod publisher;
mod report;
mod utils;

use cli::Cli;
use config::Config;
use error::{PublishError, ReportResult};
use llm::{OpenAiChat, RetryChat};
use models::PublishResult;
use news::aggregator::NewsAggregator;
use news::dedupe::{Deduplicator, PreferredHosts};
use news::search::SerpApiSearch;
use outputs::{json, markdown, pdf};
use publisher::transport::{Credentials, HttpTransport};
use publisher::{EndpointVariant, ResilientPublisher};
use report::Summarizer;
use utils::{ensure_writable_dir, today_in};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("daily_report starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(output_dir = %args.output_dir, config = ?args.config, publish = args.publish, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_cli(&args);

    // Early check: fail before spending API credits
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // Store settings are checked up front too, so a doomed upload costs nothing
    let upload_target = if args.publish {
        Some(resolve_upload_target(&config, &args)?)
    } else {
        None
    };

    // ---- Fetch and deduplicate ----
    let today = args
        .date
        .unwrap_or_else(|| today_in(config.timezone, Utc::now()));
    let window = config.window.window_for(today);
    info!(%today, timezone = %config.timezone, %window, "Report window");

    let search = SerpApiSearch::new(
        args.serpapi_key.clone(),
        &config.search.language,
        config.timeout(),
    )?;
    let deduplicator = Deduplicator::new(PreferredHosts::new(&config.preferred_hosts), config.dedupe);
    let aggregator = NewsAggregator::new(search, deduplicator);
    let articles = aggregator
        .collect(&config.source_queries, &window, config.search.per_query_limit)
        .await;

    // ---- Summarize ----
    let chat = match args.llm_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => Some(RetryChat::new(
            OpenAiChat::new(
                &config.llm.base_url,
                key,
                &config.llm.model,
                &config.llm.system_prompt,
                config.timeout(),
            )?,
            config.llm.max_retries,
            Duration::from_millis(config.llm.base_delay_ms),
        )),
        None => None,
    };
    let report = Summarizer::new(chat, config.texts.clone())
        .summarize(&articles, today)
        .await;

    // ---- Output ----
    let assets = pdf::fetch_assets(&config.document, config.timeout()).await;
    let document =
        pdf::write_report_pdf(&report, today, &config.document, &assets, &args.output_dir).await?;
    if let Err(e) = markdown::write_report(&report, today, &config.document, &args.output_dir).await
    {
        error!(error = %e, "Failed to write report Markdown");
    }
    if let Err(e) =
        json::write_report_json(&report, today, &config.document.file_prefix, &args.output_dir).await
    {
        error!(error = %e, "Failed to write report JSON");
    }

    // ---- Publish ----
    let Some((endpoints, credentials)) = upload_target else {
        println!("{}", document.display());
        info!(
            elapsed_s = start_time.elapsed().as_secs_f64(),
            path = %document.display(),
            "daily_report finished"
        );
        return Ok(());
    };

    match publish(&config, &document, &endpoints, &credentials).await {
        Ok(result) => {
            for attempt in &result.attempts {
                debug!(
                    endpoint = %attempt.endpoint,
                    filename = %attempt.filename,
                    status = ?attempt.status,
                    redirects = ?attempt.redirects,
                    "Upload attempt"
                );
            }
            println!("{}", result.url);
            info!(
                elapsed_s = start_time.elapsed().as_secs_f64(),
                url = %result.url,
                provenance = ?result.provenance,
                attempts = result.attempts.len(),
                "daily_report finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, path = %document.display(), "Publishing failed");
            Err(e.into())
        }
    }
}

fn resolve_upload_target(
    config: &Config,
    args: &Cli,
) -> Result<(Vec<EndpointVariant>, Credentials), PublishError> {
    let base_url = config
        .store
        .base_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or(PublishError::MissingCredentials("store base URL"))?;
    let credentials = Credentials::new(config.store.user.as_deref(), args.store_password.as_deref())?;
    let endpoints = EndpointVariant::wordpress_variants(base_url)?;
    info!(%base_url, endpoints = endpoints.len(), user = %credentials.username, "Publishing enabled");
    Ok((endpoints, credentials))
}

#[instrument(level = "info", skip_all)]
async fn publish(
    config: &Config,
    document: &Path,
    endpoints: &[EndpointVariant],
    credentials: &Credentials,
) -> ReportResult<PublishResult> {
    let transport = HttpTransport::new(config.timeout())?;
    let publisher = ResilientPublisher::new(transport, config.store.listing_size)
        .with_timezone(config.timezone);
    Ok(publisher.publish(document, endpoints, credentials).await?)
}
