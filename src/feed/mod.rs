// src/feed/mod.rs
pub mod providers;
pub mod types;

use anyhow::Result;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::FeedConfig;
use crate::feed::providers::file::FileFeedSource;
use crate::feed::providers::http::HttpFeedSource;
use crate::feed::providers::FeedSource;

pub use types::{Driver, Feed, SentimentMetrics};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feed_fetch_total",
            "Feed fetch attempts by outcome (ok, unconfigured, error)."
        );
    });
}

/// Single-attempt, failure-tolerant feed retrieval.
/// Every failure mode collapses to `None` ("feed unavailable").
pub struct FeedFetcher {
    source: Option<Box<dyn FeedSource>>,
}

impl FeedFetcher {
    /// Picks a source from the configured URL scheme. No URL → no source, no I/O.
    pub fn from_config(cfg: &FeedConfig) -> Result<Self> {
        let Some(url) = cfg.url.as_deref() else {
            return Ok(Self::unconfigured());
        };
        let source: Box<dyn FeedSource> = match FileFeedSource::from_url(url) {
            Some(file) => Box::new(file),
            None => Box::new(HttpFeedSource::new(url, cfg)?),
        };
        Ok(Self::with_source(source))
    }

    pub fn with_source(source: Box<dyn FeedSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn unconfigured() -> Self {
        Self { source: None }
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    pub async fn fetch_feed(&self) -> Option<Feed> {
        ensure_metrics_described();

        let Some(source) = &self.source else {
            tracing::debug!(target: "feed", "no feed url configured; skipping fetch");
            counter!("feed_fetch_total", "outcome" => "unconfigured").increment(1);
            return None;
        };

        match source.fetch().await {
            Ok(feed) => {
                counter!("feed_fetch_total", "outcome" => "ok").increment(1);
                Some(feed)
            }
            Err(e) => {
                tracing::warn!(
                    target: "feed",
                    error = ?e,
                    source = source.name(),
                    "feed unavailable"
                );
                counter!("feed_fetch_total", "outcome" => "error").increment(1);
                None
            }
        }
    }
}
