// tests/feed_http.rs
//
// HttpFeedSource / FeedFetcher against a local stub server.
// Every failure mode must collapse to `None` without panicking.

use axum::{
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::json;

use market_sentiment_analyst::config::FeedConfig;
use market_sentiment_analyst::FeedFetcher;

const FIXTURE: &str = include_str!("fixtures/feed_sample.json");

/// Serve `app` on an ephemeral port; returns the base URL.
async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn stub_routes() -> Router {
    Router::new()
        .route("/feed.json", get(|| async { FIXTURE }))
        .route(
            "/down.json",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        )
        .route("/broken.json", get(|| async { "{\"updated_at\": " }))
        .route("/null.json", get(|| async { "null" }))
        .route("/echo.json", get(echo_cache_control))
}

/// Reflects the request's Cache-Control back as `updated_at`.
async fn echo_cache_control(headers: HeaderMap) -> Json<serde_json::Value> {
    let cc = headers
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    Json(json!({ "updated_at": cc }))
}

fn fetcher_for(url: String) -> FeedFetcher {
    let cfg = FeedConfig {
        url: Some(url),
        request_timeout_secs: 5,
        ..FeedConfig::default()
    };
    FeedFetcher::from_config(&cfg).expect("fetcher from config")
}

#[tokio::test]
async fn fetches_and_decodes_a_healthy_feed() {
    let base = spawn_stub(stub_routes()).await;
    let feed = fetcher_for(format!("{base}/feed.json"))
        .fetch_feed()
        .await
        .expect("feed should be available");

    assert_eq!(feed.updated_at.as_deref(), Some("2024-01-01T00:00:00+00:00"));
    assert_eq!(feed.positive_drivers()[0].title, "Spot ETF sees record inflows");
    assert_eq!(feed.metrics().confidence, 0.5131);
}

#[tokio::test]
async fn request_asks_intermediaries_not_to_serve_cached_copies() {
    let base = spawn_stub(stub_routes()).await;
    let feed = fetcher_for(format!("{base}/echo.json")).fetch_feed().await.unwrap();
    assert_eq!(feed.updated_at.as_deref(), Some("no-cache"));
}

#[tokio::test]
async fn non_success_status_is_unavailable() {
    let base = spawn_stub(stub_routes()).await;
    assert!(fetcher_for(format!("{base}/down.json")).fetch_feed().await.is_none());
}

#[tokio::test]
async fn missing_route_is_unavailable() {
    let base = spawn_stub(stub_routes()).await;
    assert!(fetcher_for(format!("{base}/nope.json")).fetch_feed().await.is_none());
}

#[tokio::test]
async fn truncated_json_is_unavailable() {
    let base = spawn_stub(stub_routes()).await;
    assert!(fetcher_for(format!("{base}/broken.json")).fetch_feed().await.is_none());
}

#[tokio::test]
async fn json_null_is_unavailable() {
    let base = spawn_stub(stub_routes()).await;
    assert!(fetcher_for(format!("{base}/null.json")).fetch_feed().await.is_none());
}

#[tokio::test]
async fn connection_refused_is_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let fetcher = fetcher_for(format!("http://127.0.0.1:{port}/feed.json"));
    assert!(fetcher.fetch_feed().await.is_none());
}

#[tokio::test]
async fn unconfigured_url_skips_the_network() {
    let fetcher = FeedFetcher::from_config(&FeedConfig::default()).unwrap();
    assert!(!fetcher.is_configured());
    assert!(fetcher.fetch_feed().await.is_none());
}
