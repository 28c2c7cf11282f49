// src/summary/prompt.rs
use crate::config::AiConfig;
use crate::feed::types::Feed;

/// Chat messages for one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// `stale` is stated on its own line ahead of the snapshot so the caveat
/// rests on the computed verdict rather than on the model's sense of time.
pub fn build_prompt(feed: &Feed, stale: bool, cfg: &AiConfig) -> Prompt {
    let snapshot = feed_snapshot(feed, cfg.snapshot_limit_bytes);
    Prompt {
        system: cfg.system_prompt.clone(),
        user: format!("{}\nstale: {stale}\nJSON:\n{}", cfg.instructions, snapshot),
    }
}

/// Compact JSON of the feed, cut to at most `limit` bytes on a char boundary.
pub fn feed_snapshot(feed: &Feed, limit: usize) -> String {
    // Serializing a map-backed struct doesn't fail; an empty object keeps the
    // prompt usable if it ever does.
    let mut json = serde_json::to_string(feed).unwrap_or_else(|_| "{}".to_string());
    truncate_at_char_boundary(&mut json, limit);
    json
}

fn truncate_at_char_boundary(s: &mut String, limit: usize) {
    if s.len() <= limit {
        return;
    }
    let mut cut = limit;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
