// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod ai_adapter;
pub mod api;
pub mod ingest;
pub mod metrics;
pub mod signals;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::ingest::types::{FeedFetcher, FeedSource, NewsItem};
pub use crate::signals::{classify_severity, extract_cve_ids, extract_trending_topics, Severity};
