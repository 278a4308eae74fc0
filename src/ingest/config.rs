// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::FeedSource;

const ENV_PATH: &str = "FEED_SOURCES_PATH";

/// Load feed sources from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load feed sources using env var + fallbacks:
/// 1) $FEED_SOURCES_PATH
/// 2) config/feed_sources.toml
/// 3) config/feed_sources.json
/// 4) built-in defaults
pub fn load_sources_default() -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("FEED_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feed_sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feed_sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(default_sources())
}

/// Sources shipped with the binary; used when no config file is present.
pub fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("The Hacker News", "https://feeds.feedburner.com/TheHackersNews"),
        FeedSource::new("BleepingComputer", "https://www.bleepingcomputer.com/feed/"),
        FeedSource::new("Krebs on Security", "https://krebsonsecurity.com/feed/"),
        FeedSource::new("Dark Reading", "https://www.darkreading.com/rss.xml"),
        FeedSource::new("SecurityWeek", "https://www.securityweek.com/feed/"),
    ]
}

/// Only active sources take part in a fetch round.
pub fn active_sources(all: &[FeedSource]) -> Vec<FeedSource> {
    all.iter().filter(|s| s.is_active).cloned().collect()
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedSource>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<FeedSource>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<FeedSource>> {
    let v: Vec<FeedSource> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Drop entries with a blank name or url; keep the first entry per url.
fn clean_list(items: Vec<FeedSource>) -> Vec<FeedSource> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        it.name = it.name.trim().to_string();
        it.url = it.url.trim().to_string();
        if it.name.is_empty() || it.url.is_empty() {
            continue;
        }
        if seen.insert(it.url.clone()) {
            out.push(it);
        }
    }
    out
}
