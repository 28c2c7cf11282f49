use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderName},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics::{describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tower_http::cors::CorsLayer;

use crate::config::AnalysisConfig;
use crate::feed::FeedFetcher;
use crate::response::{assemble, CachePolicy};
use crate::staleness::StalenessPolicy;
use crate::summary::{build_summarizer, DynSummarizer};

pub const ANALYSIS_PATH: &str = "/api/analysis";
pub const X_ANALYSIS_SOURCE: HeaderName = HeaderName::from_static("x-analysis-source");

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Read-only per-process state; nothing here mutates between requests.
#[derive(Clone)]
pub struct AppState {
    fetcher: Arc<FeedFetcher>,
    summarizer: DynSummarizer,
    staleness: StalenessPolicy,
    cache: CachePolicy,
    clock: Clock,
}

impl AppState {
    pub fn new(
        fetcher: FeedFetcher,
        summarizer: DynSummarizer,
        staleness: StalenessPolicy,
        cache: CachePolicy,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            summarizer,
            staleness,
            cache,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn from_config(cfg: &AnalysisConfig) -> Result<Self> {
        let fetcher = FeedFetcher::from_config(&cfg.feed)?;
        let summarizer = build_summarizer(&cfg.ai)?;
        tracing::info!(
            target: "analysis",
            cadence = %cfg.feed.cadence,
            feed_configured = fetcher.is_configured(),
            stale_after_hours = cfg.feed.stale_after_hours,
            "analysis state ready"
        );
        Ok(Self::new(
            fetcher,
            summarizer,
            StalenessPolicy::from_config(&cfg.feed),
            CachePolicy::from_config(&cfg.feed),
        ))
    }

    /// Pin the clock (tests, replays).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(ANALYSIS_PATH, get(analysis))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_histogram!(
            "analysis_request_duration_ms",
            "End-to-end time of GET /api/analysis in milliseconds."
        );
    });
}

/// Always 200: every failure upstream degrades into the body, never into the status.
async fn analysis(State(state): State<AppState>) -> impl IntoResponse {
    ensure_metrics_described();
    let t0 = Instant::now();

    let feed = state.fetcher.fetch_feed().await;
    let now = (state.clock)();
    let out = assemble(feed, now, &state.staleness, state.summarizer.as_ref()).await;

    histogram!("analysis_request_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    (
        [
            (header::CACHE_CONTROL, state.cache.header_value()),
            (X_ANALYSIS_SOURCE, out.source.as_str().to_string()),
        ],
        Json(out.body),
    )
}
