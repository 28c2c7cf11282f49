// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod response;
pub mod staleness;
pub mod summary;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AnalysisConfig;
pub use crate::feed::{Feed, FeedFetcher};
pub use crate::response::{assemble, AnalysisResponse, CachePolicy, FEED_UNAVAILABLE_NOTICE};
pub use crate::staleness::StalenessPolicy;
pub use crate::summary::{build_summarizer, Summarizer};

use axum::Router;

/// Build the analysis router from process configuration (config file + env).
/// Doesn't install the metrics recorder; the service binary does that once.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AnalysisConfig::load()?;
    let state = AppState::from_config(&cfg)?;
    Ok(router(state))
}

/// Run the whole pipeline once and return the response body.
/// Used by the probe binary; it won't panic on upstream failures, those degrade into the body.
pub async fn run_once(cfg: &AnalysisConfig) -> anyhow::Result<AnalysisResponse> {
    let fetcher = FeedFetcher::from_config(&cfg.feed)?;
    let summarizer = build_summarizer(&cfg.ai)?;
    let feed = fetcher.fetch_feed().await;
    let out = assemble(
        feed,
        chrono::Utc::now(),
        &StalenessPolicy::from_config(&cfg.feed),
        summarizer.as_ref(),
    )
    .await;
    Ok(out.body)
}
