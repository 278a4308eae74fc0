// src/ingest/mod.rs
pub mod config;
pub mod fetch;
pub mod parse;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::ingest::fetch::FeedCache;
use crate::ingest::types::{FeedFetcher, FeedSource, NewsItem};

/// Hard cap on the aggregated output.
pub const MAX_ITEMS: usize = 50;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feeds_items_total", "Items parsed out of raw feed payloads.");
        describe_counter!("feeds_kept_total", "Items kept after dedup + truncation.");
        describe_counter!("feeds_dedup_total", "Items removed as duplicate links.");
        describe_counter!("feeds_fetch_errors_total", "Feed fetch failures (HTTP or network).");
        describe_counter!("feeds_cache_hits_total", "Feed bodies served from the TTL cache.");
        describe_histogram!("feeds_parse_ms", "Per-payload parse time in milliseconds.");
        describe_gauge!("aggregate_last_run_ts", "Unix ts when aggregation last ran.");
    });
}

fn pub_date_unix(ts: &str) -> i64 {
    OffsetDateTime::parse(ts, &Rfc3339)
        .map(|dt| dt.unix_timestamp())
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp())
}

/// Dedup by link (first seen wins, i.e. earlier source in enumeration
/// order), sort newest first, cap at [`MAX_ITEMS`].
pub fn dedup_sort_truncate(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());
    let mut dedup_out = 0usize;
    for it in items {
        if seen.insert(it.link.clone()) {
            unique.push(it);
        } else {
            dedup_out += 1;
        }
    }
    counter!("feeds_dedup_total").increment(dedup_out as u64);

    // Stable sort keeps source-enumeration order among equal timestamps.
    unique.sort_by_key(|it| std::cmp::Reverse(pub_date_unix(&it.pub_date)));
    unique.truncate(MAX_ITEMS);
    unique
}

/// Run one full aggregation round: fetch every active source concurrently,
/// parse each payload tolerantly, then merge.
///
/// Total failure (no active sources, or every fetch failing) is a valid
/// empty result, never an error.
pub async fn aggregate(
    fetcher: &dyn FeedFetcher,
    cache: &FeedCache,
    sources: &[FeedSource],
) -> Vec<NewsItem> {
    ensure_metrics_described();

    let active = config::active_sources(sources);
    if active.is_empty() {
        return Vec::new();
    }

    let mut merged = Vec::new();
    for (name, body) in fetch::fetch_all(fetcher, cache, &active).await {
        if let Some(raw) = body {
            merged.extend(parse::parse_items(&raw, &name));
        }
    }

    let out = dedup_sort_truncate(merged);

    counter!("feeds_kept_total").increment(out.len() as u64);
    gauge!("aggregate_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(link: &str, source: &str, date: &str) -> NewsItem {
        NewsItem {
            title: format!("article {link}"),
            link: link.to_string(),
            pub_date: date.to_string(),
            source: source.to_string(),
            description: None,
        }
    }

    #[test]
    fn dedup_keeps_first_seen_per_link() {
        let items = vec![
            item("https://x/1", "A", "2024-01-02T00:00:00+00:00"),
            item("https://x/1", "B", "2024-01-03T00:00:00+00:00"),
            item("https://x/2", "B", "2024-01-01T00:00:00+00:00"),
        ];
        let out = dedup_sort_truncate(items);
        assert_eq!(out.len(), 2);
        let kept = out.iter().find(|i| i.link == "https://x/1").unwrap();
        assert_eq!(kept.source, "A");
    }

    #[test]
    fn output_is_newest_first() {
        let items = vec![
            item("https://x/old", "A", "2023-06-01T00:00:00+00:00"),
            item("https://x/new", "A", "2024-06-01T00:00:00+00:00"),
            item("https://x/mid", "A", "2024-01-01T00:00:00+00:00"),
        ];
        let out = dedup_sort_truncate(items);
        let links: Vec<_> = out.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, ["https://x/new", "https://x/mid", "https://x/old"]);
    }

    #[test]
    fn output_is_bounded() {
        let items: Vec<_> = (0..80)
            .map(|i| item(&format!("https://x/{i}"), "A", "2024-01-01T00:00:00+00:00"))
            .collect();
        assert_eq!(dedup_sort_truncate(items).len(), MAX_ITEMS);
    }

    #[test]
    fn unparsable_date_sorts_as_now() {
        // "now" outranks any historical timestamp.
        let items = vec![
            item("https://x/dated", "A", "2020-01-01T00:00:00+00:00"),
            item("https://x/undated", "A", "garbage"),
        ];
        let out = dedup_sort_truncate(items);
        assert_eq!(out[0].link, "https://x/undated");
    }
}
