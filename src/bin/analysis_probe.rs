//! One-shot probe: run fetch → staleness → summary once with the current config
//! and print the JSON body.
//! Useful for checking a feed URL or backend key before deploying.

use market_sentiment_analyst::{run_once, AnalysisConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = AnalysisConfig::load()?;
    tracing::info!(
        cadence = %cfg.feed.cadence,
        backend = cfg.ai.backend_enabled(),
        "probe starting"
    );

    let body = run_once(&cfg).await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
