// src/summary/fallback.rs
//! Deterministic summary. Never fails, always non-empty.

use crate::feed::types::{Driver, Feed};

/// Titles quoted per driver list.
pub const MAX_DRIVER_TITLES: usize = 3;

/// `round(metric * 100)` with halves rounded up.
pub fn format_pct(v: f64) -> i64 {
    (v * 100.0 + 0.5).floor() as i64
}

pub fn fallback_analysis(feed: &Feed) -> String {
    let m = feed.metrics();
    let mut out = format!(
        "Combined {}%, crypto {}%, global {}% (confidence {}%).",
        format_pct(m.combined),
        format_pct(m.crypto),
        format_pct(m.global),
        format_pct(m.confidence),
    );
    if let Some(titles) = joined_titles(&feed.positive_drivers()) {
        out.push_str(&format!(" Pos drivers: {titles}."));
    }
    if let Some(titles) = joined_titles(&feed.negative_drivers()) {
        out.push_str(&format!(" Neg drivers: {titles}."));
    }
    out
}

fn joined_titles(items: &[Driver]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .take(MAX_DRIVER_TITLES)
            .map(|d| d.title.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    )
}
