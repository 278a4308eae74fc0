// src/signals/mod.rs
//
// Derived signals over aggregated items. All three extractors are pure
// functions: shared by every presentation caller so keyword vocabularies
// cannot drift between surfaces.

pub mod cve;
pub mod severity;
pub mod trending;

pub use cve::extract as extract_cve_ids;
pub use severity::{classify as classify_severity, Severity};
pub use trending::{extract as extract_trending_topics, TrendingTopic};
