//! News collection: search, date normalization, windowing and deduplication.
//!
//! ```text
//! SourceQuery ──► NewsSearch ──► RawHit ──► normalize_date ──► window filter
//!                                                                   │
//!                                          Vec<Article> ◄── Deduplicator
//! ```

pub mod aggregator;
pub mod dates;
pub mod dedupe;
pub mod search;
pub mod window;
