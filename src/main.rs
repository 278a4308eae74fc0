//! Cybersecurity News Aggregator — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use std::sync::{Arc, RwLock};

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cyber_news_aggregator::ai_adapter::build_ai_client;
use cyber_news_aggregator::api::{create_router, AppState};
use cyber_news_aggregator::ingest::config::load_sources_default;
use cyber_news_aggregator::ingest::fetch::{FeedCache, HttpFetcher, DEFAULT_CACHE_TTL};
use cyber_news_aggregator::metrics::Metrics;
use cyber_news_aggregator::store::{Identity, MemoryStore};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cache = Arc::new(FeedCache::new(DEFAULT_CACHE_TTL));
    let metrics = Metrics::init(cache.ttl().as_secs());

    let sources = load_sources_default().unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "feed source config unusable, using built-in defaults");
        cyber_news_aggregator::ingest::config::default_sources()
    });
    tracing::info!(count = sources.len(), "feed sources loaded");

    let state = AppState {
        fetcher: Arc::new(HttpFetcher::new()),
        sources: Arc::new(RwLock::new(sources)),
        cache,
        store: Arc::new(MemoryStore::new()),
        ai: build_ai_client(),
        identity: Identity::guest(),
    };

    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
