// Local feed.json written by the upstream pipeline; handy in development.
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use super::FeedSource;
use crate::feed::types::Feed;

pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Accepts `file:///abs/path` and `file://relative/path`.
    pub fn from_url(url: &str) -> Option<Self> {
        url.strip_prefix("file://")
            .filter(|p| !p.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    async fn fetch(&self) -> Result<Feed> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading feed from {}", self.path.display()))?;
        Feed::from_json_slice(&bytes).context("decoding feed json")
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
