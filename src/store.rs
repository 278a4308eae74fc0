// src/store.rs
//
// Curation persistence contract. The service currently runs with a single
// fixed guest principal, but the principal is an explicit parameter on
// every call so real authentication later is a wiring change, not a
// rewrite. `MemoryStore` is the in-process implementation; a database
// client slots in behind the same trait.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ingest::types::NewsItem;

/// The acting principal for persistence calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    /// The fixed identity used while the app has no authentication.
    pub fn guest() -> Self {
        Self {
            user_id: "guest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticle {
    #[serde(flatten)]
    pub item: NewsItem,
    pub saved_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingEntry {
    #[serde(flatten)]
    pub item: NewsItem,
    pub read: bool,
}

#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    async fn save_article(&self, who: &Identity, item: NewsItem) -> Result<()>;
    /// Returns true when something was actually removed.
    async fn unsave_article(&self, who: &Identity, link: &str) -> Result<bool>;
    async fn saved_articles(&self, who: &Identity) -> Result<Vec<SavedArticle>>;

    async fn reading_list_add(&self, who: &Identity, item: NewsItem) -> Result<()>;
    /// Returns true when the entry existed.
    async fn reading_list_mark_read(&self, who: &Identity, link: &str) -> Result<bool>;
    async fn reading_list(&self, who: &Identity) -> Result<Vec<ReadingEntry>>;
}

#[derive(Default)]
pub struct MemoryStore {
    saved: RwLock<HashMap<String, Vec<SavedArticle>>>,
    reading: RwLock<HashMap<String, Vec<ReadingEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn save_article(&self, who: &Identity, item: NewsItem) -> Result<()> {
        let mut guard = self.saved.write().expect("rwlock poisoned");
        let rows = guard.entry(who.user_id.clone()).or_default();
        // Saving the same link again refreshes the timestamp.
        rows.retain(|r| r.item.link != item.link);
        rows.push(SavedArticle {
            item,
            saved_at: chrono::Utc::now().timestamp(),
        });
        Ok(())
    }

    async fn unsave_article(&self, who: &Identity, link: &str) -> Result<bool> {
        let mut guard = self.saved.write().expect("rwlock poisoned");
        let Some(rows) = guard.get_mut(&who.user_id) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.item.link != link);
        Ok(rows.len() != before)
    }

    async fn saved_articles(&self, who: &Identity) -> Result<Vec<SavedArticle>> {
        let guard = self.saved.read().expect("rwlock poisoned");
        Ok(guard.get(&who.user_id).cloned().unwrap_or_default())
    }

    async fn reading_list_add(&self, who: &Identity, item: NewsItem) -> Result<()> {
        let mut guard = self.reading.write().expect("rwlock poisoned");
        let rows = guard.entry(who.user_id.clone()).or_default();
        if rows.iter().all(|r| r.item.link != item.link) {
            rows.push(ReadingEntry { item, read: false });
        }
        Ok(())
    }

    async fn reading_list_mark_read(&self, who: &Identity, link: &str) -> Result<bool> {
        let mut guard = self.reading.write().expect("rwlock poisoned");
        let Some(rows) = guard.get_mut(&who.user_id) else {
            return Ok(false);
        };
        match rows.iter_mut().find(|r| r.item.link == link) {
            Some(row) => {
                row.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reading_list(&self, who: &Identity) -> Result<Vec<ReadingEntry>> {
        let guard = self.reading.read().expect("rwlock poisoned");
        Ok(guard.get(&who.user_id).cloned().unwrap_or_default())
    }
}
