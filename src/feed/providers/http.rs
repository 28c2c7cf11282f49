use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use std::time::Duration;

use super::FeedSource;
use crate::config::FeedConfig;
use crate::feed::types::Feed;

pub const USER_AGENT: &str = concat!("market-sentiment-analyst/", env!("CARGO_PKG_VERSION"));

pub struct HttpFeedSource {
    url: String,
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, cfg: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("building feed http client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<Feed> {
        let resp = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .context("feed http get()")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("feed endpoint returned {status}"));
        }

        let body = resp.bytes().await.context("feed http body")?;
        Feed::from_json_slice(&body).context("decoding feed json")
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
