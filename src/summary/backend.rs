//! Generative backend: provider abstraction + the summarizer that wraps it.
//!
//! Providers report every problem as an error. `BackendSummarizer` makes exactly
//! one attempt and swaps any error for the template text, so callers never see a failure.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};

use super::fallback::fallback_analysis;
use super::prompt::{build_prompt, Prompt};
use super::{Analysis, AnalysisSource, Summarizer};
use crate::config::AiConfig;
use crate::feed::providers::http::USER_AGENT;
use crate::feed::types::Feed;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sampling bounds for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Sampling {
    pub fn from_config(cfg: &AiConfig) -> Self {
        Self {
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }
}

/// Low-level provider: does the remote call (or pretends to).
pub trait CompletionProvider: Send + Sync + 'static {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
        sampling: Sampling,
    ) -> BoxFuture<'a, Result<String>>;
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// OpenAI chat completions
// ------------------------------------------------------------

pub struct OpenAiProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("OpenAI provider needs OPENAI_API_KEY"))?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("building openai http client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key,
            model: cfg.model.clone(),
        })
    }

    async fn complete_impl(&self, prompt: &Prompt, sampling: Sampling) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &prompt.system,
                },
                Msg {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("openai returned {status}");
        }

        let body: Resp = resp.json().await.context("decoding openai response")?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("openai response had no message content"))
    }
}

impl CompletionProvider for OpenAiProvider {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
        sampling: Sampling,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.complete_impl(prompt, sampling))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Test providers
// ------------------------------------------------------------

/// Fixed commentary; no network.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            fixed: "Sentiment is neutral with low confidence (mock).".to_string(),
        }
    }
}

impl CompletionProvider for MockProvider {
    fn complete<'a>(
        &'a self,
        _prompt: &'a Prompt,
        _sampling: Sampling,
    ) -> BoxFuture<'a, Result<String>> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Always errors, like a backend that timed out.
#[derive(Clone, Default)]
pub struct FailingProvider;

impl CompletionProvider for FailingProvider {
    fn complete<'a>(
        &'a self,
        _prompt: &'a Prompt,
        _sampling: Sampling,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Err(anyhow!("simulated backend timeout")) })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

// ------------------------------------------------------------
// Summarizer wrapper
// ------------------------------------------------------------

pub struct BackendSummarizer<P: CompletionProvider> {
    inner: P,
    cfg: AiConfig,
}

impl<P: CompletionProvider> BackendSummarizer<P> {
    pub fn new(inner: P, cfg: AiConfig) -> Self {
        Self { inner, cfg }
    }

    async fn summarize_impl(&self, feed: &Feed, stale: bool) -> Analysis {
        let prompt = build_prompt(feed, stale, &self.cfg);
        let sampling = Sampling::from_config(&self.cfg);

        match self.inner.complete(&prompt, sampling).await {
            Ok(text) if !text.trim().is_empty() => {
                counter!("analysis_summary_total", "source" => "backend").increment(1);
                Analysis {
                    text: text.trim().to_string(),
                    source: AnalysisSource::Backend,
                }
            }
            Ok(_) => self.fall_back(feed, anyhow!("backend returned empty content")),
            Err(e) => self.fall_back(feed, e),
        }
    }

    fn fall_back(&self, feed: &Feed, cause: anyhow::Error) -> Analysis {
        tracing::warn!(
            target: "summary",
            provider = self.inner.name(),
            error = ?cause,
            "backend summary failed; using template"
        );
        counter!("analysis_summary_total", "source" => "template").increment(1);
        Analysis {
            text: fallback_analysis(feed),
            source: AnalysisSource::Template,
        }
    }
}

impl<P: CompletionProvider> Summarizer for BackendSummarizer<P> {
    fn summarize<'a>(&'a self, feed: &'a Feed, stale: bool) -> BoxFuture<'a, Analysis> {
        Box::pin(self.summarize_impl(feed, stale))
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_feed() -> Feed {
        serde_json::from_value(json!({
            "summary": {"combined_sentiment": 0.71, "confidence": 0.42},
            "drivers": {"positive": [{"title": "ETF inflow"}]}
        }))
        .unwrap()
    }

    struct Echo;

    impl CompletionProvider for Echo {
        fn complete<'a>(
            &'a self,
            prompt: &'a Prompt,
            sampling: Sampling,
        ) -> BoxFuture<'a, Result<String>> {
            let out = format!(
                "  {} tokens={} temp={}  \n",
                prompt.system, sampling.max_tokens, sampling.temperature
            );
            Box::pin(async move { Ok(out) })
        }
        fn name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test]
    async fn backend_text_is_trimmed_and_tagged() {
        let s = BackendSummarizer::new(Echo, AiConfig::default());
        let out = s.summarize(&sample_feed(), false).await;
        assert_eq!(out.source, AnalysisSource::Backend);
        assert_eq!(
            out.text,
            "You write concise factual crypto market commentary. tokens=220 temp=0.3"
        );
    }

    struct PromptEcho;

    impl CompletionProvider for PromptEcho {
        fn complete<'a>(
            &'a self,
            prompt: &'a Prompt,
            _sampling: Sampling,
        ) -> BoxFuture<'a, Result<String>> {
            let out = prompt.user.clone();
            Box::pin(async move { Ok(out) })
        }
        fn name(&self) -> &'static str {
            "prompt-echo"
        }
    }

    #[tokio::test]
    async fn staleness_verdict_reaches_the_backend() {
        let s = BackendSummarizer::new(PromptEcho, AiConfig::default());
        let stale = s.summarize(&sample_feed(), true).await;
        assert!(stale.text.contains("stale: true"));
        let fresh = s.summarize(&sample_feed(), false).await;
        assert!(fresh.text.contains("stale: false"));
    }

    #[tokio::test]
    async fn failing_backend_yields_exact_fallback() {
        let feed = sample_feed();
        let s = BackendSummarizer::new(FailingProvider, AiConfig::default());
        let out = s.summarize(&feed, false).await;
        assert_eq!(out.source, AnalysisSource::Template);
        assert_eq!(out.text, fallback_analysis(&feed));
    }

    #[tokio::test]
    async fn whitespace_only_backend_output_falls_back() {
        let feed = sample_feed();
        let s = BackendSummarizer::new(
            MockProvider {
                fixed: " \n\t ".into(),
            },
            AiConfig::default(),
        );
        let out = s.summarize(&feed, false).await;
        assert_eq!(out.source, AnalysisSource::Template);
        assert_eq!(out.text, fallback_analysis(&feed));
    }

    #[test]
    fn openai_provider_requires_a_key() {
        assert!(OpenAiProvider::new(&AiConfig::default()).is_err());
        let cfg = AiConfig {
            api_key: Some("k".into()),
            base_url: "http://127.0.0.1:9/v1/".into(),
            ..AiConfig::default()
        };
        let p = OpenAiProvider::new(&cfg).unwrap();
        assert_eq!(p.endpoint, "http://127.0.0.1:9/v1/chat/completions");
    }
}
