// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/news (annotated, ordered, empty on total failure)
// - POST /api/news/trending
// - save / saved roundtrip
// - POST /api/generate (mock success + disabled 502)

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use cyber_news_aggregator::ai_adapter::{
    CachingClient, DisabledClient, DynAiClient, GeneratedContent, MockProvider,
};
use cyber_news_aggregator::api::{create_router, AppState};
use cyber_news_aggregator::ingest::fetch::FeedCache;
use cyber_news_aggregator::store::{Identity, MemoryStore};
use cyber_news_aggregator::{FeedFetcher, FeedSource};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct CannedFetcher {
    bodies: HashMap<String, String>,
}

#[async_trait]
impl FeedFetcher for CannedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String> {
        match self.bodies.get(&source.url) {
            Some(b) => Ok(b.clone()),
            None => bail!("HTTP 500 from {}", source.name),
        }
    }
}

fn two_feed_state(ai: DynAiClient) -> AppState {
    let feed_a = r#"<rss><channel>
        <item>
          <title>Critical Zero-Day in Oracle (CVE-2024-5678)</title>
          <link>https://x/1</link>
          <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
          <description>Exploited in the wild before a fix shipped.</description>
        </item>
        <item>
          <title>Phishing toolkit spreads fast</title>
          <link>https://x/2</link>
          <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
        </item>
    </channel></rss>"#;
    let feed_b = r#"<rss><channel>
        <item>
          <title>Phishing toolkit spreads wide</title>
          <link>https://x/3</link>
          <pubDate>Wed, 03 Jan 2024 00:00:00 GMT</pubDate>
        </item>
    </channel></rss>"#;

    let bodies = HashMap::from([
        ("https://a/feed".to_string(), feed_a.to_string()),
        ("https://b/feed".to_string(), feed_b.to_string()),
    ]);

    AppState {
        fetcher: Arc::new(CannedFetcher { bodies }),
        sources: Arc::new(RwLock::new(vec![
            FeedSource::new("Feed A", "https://a/feed"),
            FeedSource::new("Feed B", "https://b/feed"),
        ])),
        cache: Arc::new(FeedCache::new(Duration::ZERO)),
        store: Arc::new(MemoryStore::new()),
        ai,
        identity: Identity::guest(),
    }
}

fn test_router() -> Router {
    create_router(two_feed_state(Arc::new(DisabledClient)))
}

async fn json_body(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_news_returns_annotated_items_newest_first() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/api/news")
        .body(Body::empty())
        .expect("build GET /api/news");

    let resp = app.oneshot(req).await.expect("oneshot /api/news");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let arr = v.as_array().expect("news response must be an array");
    assert_eq!(arr.len(), 3);

    // Newest first across both sources.
    assert_eq!(arr[0]["link"], "https://x/3");
    assert_eq!(arr[2]["link"], "https://x/1");

    // Signal annotations ride along with the wire item shape.
    let oracle = &arr[2];
    assert_eq!(oracle["title"], "Critical Zero-Day in Oracle (CVE-2024-5678)");
    assert_eq!(oracle["source"], "Feed A");
    assert_eq!(oracle["severity"], "critical");
    assert_eq!(oracle["cveIds"], json!(["CVE-2024-5678"]));
    assert!(oracle["pubDate"].as_str().unwrap().starts_with("2024-01-01"));
}

#[tokio::test]
async fn api_search_filters_titles_case_insensitively() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/api/news/search?q=PHISHING")
        .body(Body::empty())
        .expect("build GET /api/news/search");

    let resp = app.oneshot(req).await.expect("oneshot search");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let arr = v.as_array().expect("search response must be an array");
    let links: Vec<_> = arr.iter().map(|i| i["link"].as_str().unwrap()).collect();
    assert_eq!(links, ["https://x/3", "https://x/2"]);
}

#[tokio::test]
async fn api_search_matches_descriptions_too() {
    let app = test_router();

    // "wild" only appears in the Oracle item's description.
    let req = Request::builder()
        .method("GET")
        .uri("/api/news/search?q=wild")
        .body(Body::empty())
        .expect("build GET /api/news/search");

    let resp = app.oneshot(req).await.expect("oneshot search");
    let v = json_body(resp).await;
    let arr = v.as_array().expect("search response must be an array");
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["link"], "https://x/1");
}

#[tokio::test]
async fn api_search_with_empty_query_returns_everything() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/api/news/search?q=")
        .body(Body::empty())
        .expect("build GET /api/news/search");

    let resp = app.oneshot(req).await.expect("oneshot search");
    let v = json_body(resp).await;
    assert_eq!(v.as_array().expect("array").len(), 3);
}

#[tokio::test]
async fn api_news_is_empty_array_when_every_source_fails() {
    let mut state = two_feed_state(Arc::new(DisabledClient));
    state.fetcher = Arc::new(CannedFetcher {
        bodies: HashMap::new(),
    });
    let app = create_router(state);

    let req = Request::builder()
        .method("GET")
        .uri("/api/news")
        .body(Body::empty())
        .expect("build GET /api/news");

    let resp = app.oneshot(req).await.expect("oneshot /api/news");
    assert_eq!(resp.status(), StatusCode::OK, "total failure is not an error");
    let v = json_body(resp).await;
    assert_eq!(v, json!([]));
}

#[tokio::test]
async fn api_trending_reports_cross_source_topics() {
    let app = test_router();

    let req = Request::builder()
        .method("POST")
        .uri("/api/news/trending")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "seenLinks": [] }).to_string()))
        .expect("build POST /api/news/trending");

    let resp = app.oneshot(req).await.expect("oneshot trending");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let topics = v.as_array().expect("topics array");
    let phishing = topics
        .iter()
        .find(|t| t["keyword"] == "phishing")
        .expect("'phishing' appears in two sources");
    assert_eq!(phishing["sourceCount"], 2);
    assert_eq!(phishing["isNew"], true);
}

#[tokio::test]
async fn api_save_and_list_saved_roundtrip() {
    let app = test_router();

    let item = json!({
        "title": "Saved story",
        "link": "https://x/saved",
        "pubDate": "2024-01-01T00:00:00+00:00",
        "source": "Feed A"
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/articles/save")
        .header("content-type", "application/json")
        .body(Body::from(item.to_string()))
        .expect("build POST /api/articles/save");
    let resp = app.clone().oneshot(req).await.expect("oneshot save");
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .method("GET")
        .uri("/api/articles/saved")
        .body(Body::empty())
        .expect("build GET /api/articles/saved");
    let resp = app.oneshot(req).await.expect("oneshot saved");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let rows = v.as_array().expect("saved array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["link"], "https://x/saved");
    assert!(rows[0]["savedAt"].is_i64());
}

#[tokio::test]
async fn api_generate_returns_content_with_mock_provider() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mock = MockProvider {
        fixed: GeneratedContent {
            content: "A tidy mock summary.".to_string(),
        },
    };
    let ai: DynAiClient = Arc::new(CachingClient::new(mock, dir.path().to_path_buf(), 10));
    let app = create_router(two_feed_state(ai));

    let req = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "title": "Critical Zero-Day in Oracle",
                "description": "Exploited in the wild.",
                "format": "summary"
            })
            .to_string(),
        ))
        .expect("build POST /api/generate");

    let resp = app.oneshot(req).await.expect("oneshot generate");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["content"], "A tidy mock summary.");
    assert_eq!(v["provider"], "mock");
}

#[tokio::test]
async fn api_generate_failure_is_a_distinct_upstream_error() {
    let app = test_router(); // DisabledClient

    let req = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "title": "Anything", "format": "social_post" }).to_string(),
        ))
        .expect("build POST /api/generate");

    let resp = app.oneshot(req).await.expect("oneshot generate");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v = json_body(resp).await;
    assert!(v["error"].as_str().unwrap().contains("generation"));
}
