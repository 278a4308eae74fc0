// src/signals/trending.rs
//
// Trending-topic extraction: tokens from article titles that appear
// across at least two distinct sources in the current aggregation window.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::ingest::types::NewsItem;

/// Number of topics returned.
pub const TOP_TOPICS: usize = 5;
/// Tokens this short never trend.
pub const MIN_TOKEN_LEN: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTopic {
    pub keyword: String,
    pub source_count: usize,
    pub articles: Vec<NewsItem>,
    /// True when any contributing article was not in the caller's
    /// previously-seen link set.
    pub is_new: bool,
}

static RE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "about", "above", "after", "again", "against", "around", "because", "before", "being",
        "between", "could", "during", "every", "first", "other", "others", "report", "reports",
        "should", "since", "still", "their", "there", "these", "those", "through", "under",
        "until", "using", "where", "which", "while", "would", "years",
    ]
    .into_iter()
    .collect()
});

fn title_tokens(title: &str) -> HashSet<String> {
    let lowered = title.to_lowercase();
    let stripped = RE_PUNCT.replace_all(&lowered, " ");
    stripped
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN && !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Extract the top trending topics from the current item set. Pure and
/// deterministic: ranked by distinct-source count, then contributing
/// article count, then keyword.
pub fn extract(items: &[NewsItem], previously_seen: &HashSet<String>) -> Vec<TrendingTopic> {
    let mut by_token: HashMap<String, Vec<&NewsItem>> = HashMap::new();
    for item in items {
        for token in title_tokens(&item.title) {
            by_token.entry(token).or_default().push(item);
        }
    }

    let mut topics: Vec<TrendingTopic> = by_token
        .into_iter()
        .filter_map(|(keyword, articles)| {
            let source_count = articles
                .iter()
                .map(|a| a.source.as_str())
                .collect::<HashSet<_>>()
                .len();
            if source_count < 2 {
                return None;
            }
            let is_new = articles.iter().any(|a| !previously_seen.contains(&a.link));
            Some(TrendingTopic {
                keyword,
                source_count,
                articles: articles.into_iter().cloned().collect(),
                is_new,
            })
        })
        .collect();

    topics.sort_by(|a, b| {
        b.source_count
            .cmp(&a.source_count)
            .then(b.articles.len().cmp(&a.articles.len()))
            .then(a.keyword.cmp(&b.keyword))
    });
    topics.truncate(TOP_TOPICS);
    topics
}
