// src/ingest/fetch.rs
//
// Concurrent feed retrieval. Every source is fetched in the same round,
// one failure never delays or aborts the rest, and responses may be
// served from a short-lived in-memory cache to bound upstream load.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use metrics::counter;

use crate::ingest::types::{FeedFetcher, FeedSource};

pub const FETCH_USER_AGENT: &str = "cyber-news-aggregator/0.1 (+feed-reader)";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Production fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(FETCH_USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("GET {}", source.url))?;
        if !resp.status().is_success() {
            bail!("{} returned HTTP {}", source.name, resp.status());
        }
        resp.text()
            .await
            .with_context(|| format!("reading body from {}", source.name))
    }
}

/// Read-through response cache keyed by feed URL. Entries past the TTL are
/// treated as absent and replaced wholesale on the next successful fetch.
pub struct FeedCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, String)>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, url: &str) -> Option<String> {
        let guard = self.entries.read().expect("rwlock poisoned");
        guard.get(url).and_then(|(at, body)| {
            if at.elapsed() < self.ttl {
                Some(body.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, url: &str, body: &str) {
        let mut guard = self.entries.write().expect("rwlock poisoned");
        guard.insert(url.to_string(), (Instant::now(), body.to_string()));
    }
}

/// Fetch every source concurrently. Output length equals input length;
/// a failed source maps to `None` instead of poisoning the round.
pub async fn fetch_all(
    fetcher: &dyn FeedFetcher,
    cache: &FeedCache,
    sources: &[FeedSource],
) -> Vec<(String, Option<String>)> {
    if sources.is_empty() {
        return Vec::new();
    }

    let fetches = sources.iter().map(|src| async move {
        if let Some(body) = cache.get(&src.url) {
            counter!("feeds_cache_hits_total").increment(1);
            return (src.name.clone(), Some(body));
        }
        match fetcher.fetch(src).await {
            Ok(body) => {
                cache.put(&src.url, &body);
                (src.name.clone(), Some(body))
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = %src.name, "feed fetch failed");
                counter!("feeds_fetch_errors_total").increment(1);
                (src.name.clone(), None)
            }
        }
    });

    futures::future::join_all(fetches).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_within_ttl() {
        let cache = FeedCache::new(Duration::from_secs(60));
        cache.put("https://a/feed", "<rss/>");
        assert_eq!(cache.get("https://a/feed").as_deref(), Some("<rss/>"));
        assert!(cache.get("https://b/feed").is_none());
    }

    #[test]
    fn zero_ttl_cache_never_hits() {
        let cache = FeedCache::new(Duration::ZERO);
        cache.put("https://a/feed", "<rss/>");
        assert!(cache.get("https://a/feed").is_none());
    }

    struct Canned;

    #[async_trait::async_trait]
    impl FeedFetcher for Canned {
        async fn fetch(&self, source: &FeedSource) -> Result<String> {
            if source.name == "bad" {
                bail!("boom");
            }
            Ok(format!("body for {}", source.name))
        }
    }

    #[tokio::test]
    async fn failed_source_maps_to_none_without_aborting() {
        let cache = FeedCache::new(Duration::ZERO);
        let sources = vec![
            FeedSource::new("good", "https://g/feed"),
            FeedSource::new("bad", "https://b/feed"),
        ];
        let out = fetch_all(&Canned, &cache, &sources).await;
        assert_eq!(out.len(), 2);
        let by_name: std::collections::HashMap<_, _> = out.into_iter().collect();
        assert!(by_name["good"].is_some());
        assert!(by_name["bad"].is_none());
    }

    #[tokio::test]
    async fn empty_source_list_is_a_no_op() {
        let cache = FeedCache::new(DEFAULT_CACHE_TTL);
        let out = fetch_all(&Canned, &cache, &[]).await;
        assert!(out.is_empty());
    }
}
