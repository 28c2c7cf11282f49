// src/response.rs
//! Response assembly: feed fields + staleness verdict + summary text, plus the cache policy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::FeedConfig;
use crate::feed::types::Feed;
use crate::staleness::StalenessPolicy;
use crate::summary::{AnalysisSource, Summarizer};

pub const FEED_UNAVAILABLE_NOTICE: &str =
    "Feed unavailable; using last cached analysis if present.";

/// Body of `GET /api/analysis`. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub updated_at: Option<String>,
    pub stale: bool,
    /// Echoed as received. `null` only when the feed itself was unavailable.
    pub summary: Option<Map<String, Value>>,
    /// Echoed as received, with `positive` / `negative` always present as arrays.
    pub drivers: Map<String, Value>,
    pub history: Vec<Value>,
}

const DRIVER_SIDES: [&str; 2] = ["positive", "negative"];

fn drivers_with_both_sides(raw: Option<Map<String, Value>>) -> Map<String, Value> {
    let mut drivers = raw.unwrap_or_default();
    for side in DRIVER_SIDES {
        if !drivers.get(side).is_some_and(Value::is_array) {
            drivers.insert(side.to_string(), Value::Array(Vec::new()));
        }
    }
    drivers
}

/// What produced `analysis`; surfaced as a diagnostic header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Backend,
    Template,
    Unavailable,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Backend => "backend",
            ResponseSource::Template => "template",
            ResponseSource::Unavailable => "unavailable",
        }
    }
}

impl From<AnalysisSource> for ResponseSource {
    fn from(s: AnalysisSource) -> Self {
        match s {
            AnalysisSource::Backend => ResponseSource::Backend,
            AnalysisSource::Template => ResponseSource::Template,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub body: AnalysisResponse,
    pub source: ResponseSource,
}

/// Shared-cache policy: fresh for one cadence, then a short stale-while-revalidate grace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub max_age_secs: u64,
    pub stale_while_revalidate_secs: u64,
}

impl CachePolicy {
    pub fn from_config(cfg: &FeedConfig) -> Self {
        Self {
            max_age_secs: cfg.cache_max_age_secs,
            stale_while_revalidate_secs: cfg.stale_while_revalidate_secs,
        }
    }

    pub fn header_value(&self) -> String {
        format!(
            "s-maxage={}, stale-while-revalidate={}",
            self.max_age_secs, self.stale_while_revalidate_secs
        )
    }
}

/// Merge a fetch result into the response.
/// No feed → fixed notice, `summary: null`, empty drivers/history, not stale;
/// the summarizer isn't called.
pub async fn assemble(
    feed: Option<Feed>,
    now: DateTime<Utc>,
    policy: &StalenessPolicy,
    summarizer: &dyn Summarizer,
) -> Assembled {
    let Some(feed) = feed else {
        return Assembled {
            body: AnalysisResponse {
                analysis: FEED_UNAVAILABLE_NOTICE.to_string(),
                updated_at: None,
                stale: false,
                summary: None,
                drivers: drivers_with_both_sides(None),
                history: Vec::new(),
            },
            source: ResponseSource::Unavailable,
        };
    };

    let stale = policy.is_stale(feed.updated_at.as_deref(), now);
    let analysis = summarizer.summarize(&feed, stale).await;

    tracing::debug!(
        target: "analysis",
        stale,
        source = analysis.source.as_str(),
        updated_at = feed.updated_at.as_deref().unwrap_or("-"),
        "analysis assembled"
    );

    let Feed {
        updated_at,
        summary,
        drivers,
        history,
        ..
    } = feed;

    Assembled {
        body: AnalysisResponse {
            analysis: analysis.text,
            updated_at,
            stale,
            summary: Some(summary.unwrap_or_default()),
            drivers: drivers_with_both_sides(drivers),
            history: history.unwrap_or_default(),
        },
        source: analysis.source.into(),
    }
}
