//! Command-line interface definitions for the daily report.
//!
//! Secrets are only ever read from flags or environment variables, never
//! from the config file.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the daily report.
///
/// # Examples
///
/// ```sh
/// # Render into ./out using the default outlets
/// daily_report -o ./out
///
/// # Custom config, explicit run date, upload the result
/// daily_report -o ./out -c report.yaml --date 2025-08-18 --publish
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the report PDF and its Markdown and JSON copies
    #[arg(short, long, default_value = "./out")]
    pub output_dir: String,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Run date (YYYY-MM-DD); defaults to today in the configured timezone
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Upload the rendered document to the media store
    #[arg(long)]
    pub publish: bool,

    /// SerpAPI key; without it no news is fetched
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    pub serpapi_key: Option<String>,

    /// OpenAI-compatible API key; without it titles are used unsummarized
    #[arg(long, env = "INV_OAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Logo image URL placed in the document header
    #[arg(long, env = "INV_LOGO_URL")]
    pub logo_url: Option<String>,

    /// Regular TrueType font for the PDF body
    #[arg(long, env = "INV_POPPINS_REG_URL")]
    pub font_regular_url: Option<String>,

    /// Bold TrueType font for PDF titles
    #[arg(long, env = "INV_POPPINS_BOLD_URL")]
    pub font_bold_url: Option<String>,

    /// Media store site root, e.g. https://blog.example.com
    #[arg(long, env = "WP_BASE_URL")]
    pub store_base_url: Option<String>,

    /// Media store user
    #[arg(long, env = "WP_USER")]
    pub store_user: Option<String>,

    /// Media store application password
    #[arg(long, env = "WP_APP_PASSWORD", hide_env_values = true)]
    pub store_password: Option<String>,
}
