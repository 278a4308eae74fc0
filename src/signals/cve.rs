// src/signals/cve.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::NewsItem;

// Year is exactly 4 digits, sequence number 4 or more.
static RE_CVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCVE-\d{4}-\d{4,}\b").unwrap());

/// Collect CVE identifiers from title and description independently,
/// deduplicated, in first-occurrence order, canonical uppercase form.
pub fn extract(item: &NewsItem) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    let fields = [Some(item.title.as_str()), item.description.as_deref()];
    for text in fields.into_iter().flatten() {
        for m in RE_CVE.find_iter(text) {
            let id = m.as_str().to_uppercase();
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }
    out
}
