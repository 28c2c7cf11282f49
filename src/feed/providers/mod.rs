// src/feed/providers/mod.rs
pub mod file;
pub mod http;

use anyhow::Result;
use async_trait::async_trait;

use crate::feed::types::Feed;

/// Where a feed document comes from. Implementations report failures as errors;
/// [`FeedFetcher`](crate::feed::FeedFetcher) collapses them to "unavailable".
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Feed>;
    fn name(&self) -> &'static str;
}

/// In-memory document, decoded on every fetch like a real body would be.
pub struct StaticFeedSource {
    body: String,
}

impl StaticFeedSource {
    pub fn from_json_str(body: &str) -> Self {
        Self {
            body: body.to_string(),
        }
    }

    pub fn from_value(v: &serde_json::Value) -> Self {
        Self {
            body: v.to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self) -> Result<Feed> {
        Ok(Feed::from_json_slice(self.body.as_bytes())?)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
