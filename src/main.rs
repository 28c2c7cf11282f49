//! Market sentiment analyst: service entrypoint.
//! Boots the Axum HTTP server: config, analysis state, routes, metrics.

use market_sentiment_analyst::{api, metrics::Metrics, AnalysisConfig, AppState, CachePolicy};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only; the Shuttle runtime
/// installs its own subscriber in deployed environments.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - ANALYSIS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("ANALYSIS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

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

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed=debug,summary=info,analysis=debug,warn"));

    // A subscriber may already be installed by the runtime; keep that one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AnalysisConfig::load()?;
    tracing::info!(feed = ?cfg.feed, ai = ?cfg.ai, "analysis config loaded");

    let metrics = Metrics::init(&CachePolicy::from_config(&cfg.feed))?;
    let state = AppState::from_config(&cfg)?;
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
