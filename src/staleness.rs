//! Staleness verdict for the feed's `updated_at`.
//!
//! Pure computation: callers pass the clock in.
//! - absent or unparseable timestamp → not stale
//! - stale iff `now - updated_at > threshold` (exclusive boundary, millisecond precision)
//! - future timestamps have negative age → not stale

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::config::FeedConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    threshold: Duration,
}

impl StalenessPolicy {
    pub fn from_hours(hours: f64) -> Self {
        let ms = (hours * 3_600_000.0).round();
        Self {
            threshold: Duration::milliseconds(ms.max(0.0) as i64),
        }
    }

    pub fn from_config(cfg: &FeedConfig) -> Self {
        Self::from_hours(cfg.stale_after_hours)
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Verdict for a raw upstream timestamp string.
    pub fn is_stale(&self, updated_at: Option<&str>, now: DateTime<Utc>) -> bool {
        updated_at
            .and_then(parse_timestamp)
            .is_some_and(|ts| self.is_stale_at(ts, now))
    }

    pub fn is_stale_at(&self, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(updated_at) > self.threshold
    }
}

/// Age of the feed, if its timestamp is usable. Negative for future timestamps.
pub fn feed_age(updated_at: Option<&str>, now: DateTime<Utc>) -> Option<Duration> {
    updated_at
        .and_then(parse_timestamp)
        .map(|ts| now.signed_duration_since(ts))
}

/// RFC 3339 with any offset, or a naive ISO timestamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
