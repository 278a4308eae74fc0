// src/api.rs
//
// HTTP surface. Aggregation is stateless per request; partial source
// failure is never surfaced as an error here, only a genuine fault is.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::ai_adapter::{build_prompt, ContentFormat, DynAiClient};
use crate::ingest::{
    self,
    config as feed_config,
    fetch::FeedCache,
    types::{FeedFetcher, FeedSource, NewsItem},
};
use crate::signals::{self, Severity, TrendingTopic};
use crate::store::{ArticleStore, Identity, ReadingEntry, SavedArticle};

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn FeedFetcher>,
    pub sources: Arc<RwLock<Vec<FeedSource>>>,
    pub cache: Arc<FeedCache>,
    pub store: Arc<dyn ArticleStore>,
    pub ai: DynAiClient,
    /// The acting principal, injected once at the edge. Guest today;
    /// a real auth layer swaps this for a per-request extractor.
    pub identity: Identity,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/news", get(get_news))
        .route("/api/news/search", get(search_news))
        .route("/api/news/trending", post(trending))
        .route("/api/articles/save", post(save_article).delete(unsave_article))
        .route("/api/articles/saved", get(saved_articles))
        .route("/api/reading-list", get(reading_list).post(reading_list_add))
        .route("/api/reading-list/read", post(reading_list_mark_read))
        .route("/api/generate", post(generate_content))
        .route("/admin/reload-sources", get(admin_reload_sources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// One aggregated item plus its derived presentation signals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub severity: Severity,
    pub cve_ids: Vec<String>,
}

fn annotate(item: NewsItem) -> AnnotatedItem {
    let severity = signals::classify_severity(&item);
    let cve_ids = signals::extract_cve_ids(&item);
    AnnotatedItem {
        item,
        severity,
        cve_ids,
    }
}

async fn current_items(state: &AppState) -> Vec<NewsItem> {
    let sources = state.sources.read().expect("rwlock poisoned").clone();
    ingest::aggregate(state.fetcher.as_ref(), &state.cache, &sources).await
}

async fn get_news(State(state): State<AppState>) -> Json<Vec<AnnotatedItem>> {
    let items = current_items(&state).await;
    Json(items.into_iter().map(annotate).collect())
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search_news(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<AnnotatedItem>> {
    let needle = params.q.to_lowercase();
    let items = current_items(&state).await;
    let hits = items
        .into_iter()
        .filter(|it| {
            needle.is_empty()
                || it.title.to_lowercase().contains(&needle)
                || it
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .map(annotate)
        .collect();
    Json(hits)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendingReq {
    /// Links the client has already shown; topics with only these links
    /// are not flagged as new.
    #[serde(default)]
    seen_links: Vec<String>,
}

async fn trending(
    State(state): State<AppState>,
    Json(body): Json<TrendingReq>,
) -> Json<Vec<TrendingTopic>> {
    let seen: HashSet<String> = body.seen_links.into_iter().collect();
    let items = current_items(&state).await;
    Json(signals::extract_trending_topics(&items, &seen))
}

type ApiError = (StatusCode, String);

fn internal_error(e: anyhow::Error) -> ApiError {
    tracing::error!(error = ?e, "store operation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
}

#[derive(Serialize)]
struct OkBody {
    ok: bool,
}

async fn save_article(
    State(state): State<AppState>,
    Json(item): Json<NewsItem>,
) -> Result<Json<OkBody>, ApiError> {
    state
        .store
        .save_article(&state.identity, item)
        .await
        .map_err(internal_error)?;
    Ok(Json(OkBody { ok: true }))
}

#[derive(Deserialize)]
struct LinkParam {
    link: String,
}

async fn unsave_article(
    State(state): State<AppState>,
    Query(params): Query<LinkParam>,
) -> Result<Json<OkBody>, ApiError> {
    let removed = state
        .store
        .unsave_article(&state.identity, &params.link)
        .await
        .map_err(internal_error)?;
    if removed {
        Ok(Json(OkBody { ok: true }))
    } else {
        Err((StatusCode::NOT_FOUND, "not saved".to_string()))
    }
}

async fn saved_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedArticle>>, ApiError> {
    let rows = state
        .store
        .saved_articles(&state.identity)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows))
}

async fn reading_list_add(
    State(state): State<AppState>,
    Json(item): Json<NewsItem>,
) -> Result<Json<OkBody>, ApiError> {
    state
        .store
        .reading_list_add(&state.identity, item)
        .await
        .map_err(internal_error)?;
    Ok(Json(OkBody { ok: true }))
}

async fn reading_list_mark_read(
    State(state): State<AppState>,
    Json(params): Json<LinkParam>,
) -> Result<Json<OkBody>, ApiError> {
    let found = state
        .store
        .reading_list_mark_read(&state.identity, &params.link)
        .await
        .map_err(internal_error)?;
    if found {
        Ok(Json(OkBody { ok: true }))
    } else {
        Err((StatusCode::NOT_FOUND, "not on reading list".to_string()))
    }
}

async fn reading_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReadingEntry>>, ApiError> {
    let rows = state
        .store
        .reading_list(&state.identity)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct GenerateReq {
    title: String,
    #[serde(default)]
    description: Option<String>,
    format: ContentFormat,
}

#[derive(Serialize)]
struct GenerateResp {
    content: String,
    provider: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Generation failure is a distinct upstream error, never an empty
/// success: the client must be able to tell "no content" from "the
/// model call failed".
async fn generate_content(
    State(state): State<AppState>,
    Json(req): Json<GenerateReq>,
) -> Result<Json<GenerateResp>, (StatusCode, Json<ErrorBody>)> {
    let prompt = build_prompt(req.format, &req.title, req.description.as_deref());
    match state.ai.generate(&prompt).await {
        Some(generated) => Ok(Json(GenerateResp {
            content: generated.content,
            provider: state.ai.provider_name(),
        })),
        None => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                error: "content generation unavailable".to_string(),
            }),
        )),
    }
}

async fn admin_reload_sources(State(state): State<AppState>) -> String {
    match feed_config::load_sources_default() {
        Ok(fresh) => {
            let n = fresh.len();
            match state.sources.write() {
                Ok(mut w) => {
                    *w = fresh;
                    format!("reloaded {n} sources")
                }
                Err(_) => "failed: lock poisoned".to_string(),
            }
        }
        Err(e) => format!("failed: {e}"),
    }
}
