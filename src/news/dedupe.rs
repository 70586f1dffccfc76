//! Headline deduplication with a source preference.
//!
//! Several outlets usually cover the same story. Titles are reduced to a key
//! (lower-case, asides in brackets removed, whitespace collapsed) and
//! compared either for equality or with a similarity ratio. One article per
//! story survives; an article from a preferred host displaces one that is
//! not.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Article;

static ASIDES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap());

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

fn default_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

/// How two title keys are judged to describe the same story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchMode {
    /// Identical title keys.
    #[default]
    Exact,
    /// Similarity ratio of the title keys at or above `threshold`.
    Fuzzy {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

impl MatchMode {
    pub fn is_duplicate(&self, a: &str, b: &str) -> bool {
        match *self {
            MatchMode::Exact => a == b,
            MatchMode::Fuzzy { threshold } => similarity(a, b) >= threshold,
        }
    }
}

/// Comparison key for a headline.
pub fn title_key(title: &str) -> String {
    let stripped = ASIDES.replace_all(title, " ");
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized Levenshtein similarity in `[0, 1]`, symmetric in its arguments.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Hosts whose coverage wins ties. A listed host also covers its subdomains.
#[derive(Debug, Clone, Default)]
pub struct PreferredHosts(Vec<String>);

impl PreferredHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            hosts
                .into_iter()
                .map(|h| {
                    let h = h.as_ref().trim().to_ascii_lowercase();
                    h.strip_prefix("www.").map(str::to_string).unwrap_or(h)
                })
                .filter(|h| !h.is_empty())
                .collect(),
        )
    }

    pub fn matches(&self, hostname: &str) -> bool {
        let hostname = hostname.to_ascii_lowercase();
        self.0.iter().any(|preferred| {
            hostname == *preferred
                || hostname
                    .strip_suffix(preferred.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    preferred: PreferredHosts,
    mode: MatchMode,
}

impl Deduplicator {
    pub fn new(preferred: PreferredHosts, mode: MatchMode) -> Self {
        Self { preferred, mode }
    }

    /// Collapse duplicate stories and order the survivors.
    ///
    /// Output: preferred-host articles first, then by source and title
    /// (case-insensitive). The result does not depend on input order and is
    /// a fixed point of this function.
    pub fn dedupe_and_prioritize(&self, mut articles: Vec<Article>) -> Vec<Article> {
        let before = articles.len();
        // canonical offer order makes "first seen" independent of fetch order
        articles.sort_by(|a, b| self.order(a, b));

        let mut kept: Vec<(String, Article)> = Vec::with_capacity(articles.len());
        for candidate in articles {
            let key = title_key(&candidate.title);
            match kept
                .iter_mut()
                .find(|(existing, _)| self.mode.is_duplicate(existing, &key))
            {
                Some(slot) => {
                    if self.preferred.matches(&candidate.hostname)
                        && !self.preferred.matches(&slot.1.hostname)
                    {
                        debug!(
                            kept = %candidate.url,
                            dropped = %slot.1.url,
                            "Preferred source replaces duplicate"
                        );
                        *slot = (key, candidate);
                    } else {
                        debug!(kept = %slot.1.url, dropped = %candidate.url, "Duplicate dropped");
                    }
                }
                None => kept.push((key, candidate)),
            }
        }

        let mut out: Vec<Article> = kept.into_iter().map(|(_, a)| a).collect();
        out.sort_by(|a, b| self.order(a, b));
        debug!(before, after = out.len(), "Deduplicated articles");
        out
    }

    fn order(&self, a: &Article, b: &Article) -> Ordering {
        let a_rank = !self.preferred.matches(&a.hostname);
        let b_rank = !self.preferred.matches(&b.hostname);
        a_rank
            .cmp(&b_rank)
            .then_with(|| a.source.to_lowercase().cmp(&b.source.to_lowercase()))
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.url.cmp(&b.url))
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.published_date.cmp(&b.published_date))
    }
}
