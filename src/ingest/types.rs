// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One configured feed endpoint. Managed by the admin surface; the
/// aggregation core only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl FeedSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            is_active: true,
        }
    }
}

/// A single normalized article. `link` is the identity: two items with the
/// same link are the same article no matter which source emitted them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// RFC 3339; the parser substitutes "now" when the feed omits or
    /// mangles the date.
    pub pub_date: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Transport seam for feed retrieval, so tests can stub the network.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<String>;
}
