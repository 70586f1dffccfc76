//! Normalization of the free-form date strings returned by the search API.
//!
//! Outlets report dates in whatever shape their CMS emits. Strategies are
//! tried in order, most specific first; a string none of them understands
//! (including relative phrases like "3 hours ago") is unknown and the hit is
//! dropped by the caller.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());
static DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{2}|\d{4})\b").unwrap());
static TEXTUAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{3,9})\.? (\d{1,2}), (\d{4})").unwrap());
static US_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

type Strategy = fn(&str) -> Option<NaiveDate>;

const STRATEGIES: &[Strategy] = &[iso_prefixed, dotted, textual_month, us_numeric];

/// Normalize a raw date string into a calendar date.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() || raw.to_ascii_lowercase().contains("ago") {
        return None;
    }
    STRATEGIES.iter().find_map(|strategy| strategy(raw))
}

/// `2025-08-18`, `2025-08-18T07:00:00Z`, ...
fn iso_prefixed(raw: &str) -> Option<NaiveDate> {
    if !ISO_PREFIX.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d").ok()
}

/// `18.08.25` or `18.08.2025`; two-digit years are 20xx.
fn dotted(raw: &str) -> Option<NaiveDate> {
    let caps = DOTTED.captures(raw)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = if caps[3].len() == 2 {
        format!("20{}", &caps[3]).parse().ok()?
    } else {
        caps[3].parse().ok()?
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `Aug 18, 2025`, `August 18, 2025` or the wire-style `Sept. 18, 2025`.
fn textual_month(raw: &str) -> Option<NaiveDate> {
    let caps = TEXTUAL.captures(raw)?;
    let month = if caps[1].eq_ignore_ascii_case("sept") {
        "Sep"
    } else {
        &caps[1]
    };
    let normalized = format!("{} {} {}", month, &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&normalized, "%b %d %Y")
        .or_else(|_| NaiveDate::parse_from_str(&normalized, "%B %d %Y"))
        .ok()
}

/// `08/18/2025, 07:00 AM, +0000 UTC` as emitted by Google News.
fn us_numeric(raw: &str) -> Option<NaiveDate> {
    let caps = US_NUMERIC.captures(raw)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
