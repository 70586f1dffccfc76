//! Multi-source news aggregation over a date window.

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::models::{hostname_of, Article, RawHit, SourceQuery};
use crate::news::dates::normalize_date;
use crate::news::dedupe::Deduplicator;
use crate::news::search::NewsSearch;
use crate::news::window::ArticleWindow;

pub struct NewsAggregator<S> {
    search: S,
    deduplicator: Deduplicator,
}

impl<S: NewsSearch> NewsAggregator<S> {
    pub fn new(search: S, deduplicator: Deduplicator) -> Self {
        Self {
            search,
            deduplicator,
        }
    }

    /// Run every query against the search backend, one after another, and
    /// keep the hits whose normalized date falls inside `window`.
    ///
    /// A query that fails contributes nothing; the others still count.
    #[instrument(level = "info", skip_all, fields(%window, queries = source_queries.len()))]
    pub async fn fetch_window(
        &self,
        source_queries: &[SourceQuery],
        window: &ArticleWindow,
        per_query_limit: usize,
    ) -> Vec<Article> {
        let articles: Vec<Article> = stream::iter(source_queries)
            .then(|source_query| async move {
                let query = source_query.render(window.after, window.before);
                match self.search.search(&query, window, per_query_limit).await {
                    Ok(hits) if hits.is_empty() => {
                        debug!(source = %source_query.source, "Query returned no hits");
                        Vec::new()
                    }
                    Ok(hits) => admit_hits(source_query, hits, window),
                    Err(e) => {
                        warn!(source = %source_query.source, error = %e, "Search query failed; skipping");
                        Vec::new()
                    }
                }
            })
            .flat_map(stream::iter)
            .collect()
            .await;

        info!(count = articles.len(), "Fetched articles inside window");
        articles
    }

    /// Fetch, then collapse duplicate stories.
    pub async fn collect(
        &self,
        source_queries: &[SourceQuery],
        window: &ArticleWindow,
        per_query_limit: usize,
    ) -> Vec<Article> {
        let articles = self
            .fetch_window(source_queries, window, per_query_limit)
            .await;
        let unique = self.deduplicator.dedupe_and_prioritize(articles);
        info!(count = unique.len(), "Articles after deduplication");
        unique
    }
}

fn admit_hits(source_query: &SourceQuery, hits: Vec<RawHit>, window: &ArticleWindow) -> Vec<Article> {
    hits.into_iter()
        .filter_map(|hit| to_article(source_query, hit, window))
        .collect()
}

fn to_article(source_query: &SourceQuery, hit: RawHit, window: &ArticleWindow) -> Option<Article> {
    let link = hit.link.trim();
    if link.is_empty() {
        debug!(title = %hit.title, "Hit without link dropped");
        return None;
    }

    let date = hit
        .iso_date
        .as_deref()
        .and_then(normalize_date)
        .or_else(|| hit.date.as_deref().and_then(normalize_date));
    let Some(date) = date else {
        debug!(url = %link, raw_date = ?hit.date, "Hit with unknown date dropped");
        return None;
    };
    if !window.contains(date) {
        debug!(url = %link, %date, "Hit outside window dropped");
        return None;
    }

    let source = hit
        .source
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(source_query.source.clone()).filter(|s| !s.is_empty()))
        .or_else(|| hostname_of(link))
        .unwrap_or_default();

    Some(Article::new(&hit.title, link, &source, date))
}
