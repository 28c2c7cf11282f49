// src/summary/mod.rs
//! Summary generation: one `Summarizer` contract, two variants.
//!
//! - `TemplateSummarizer`: deterministic text, used when no backend is configured.
//! - `BackendSummarizer`: one call to a generative backend, template text on any failure.

pub mod backend;
pub mod fallback;
pub mod prompt;

use std::sync::Arc;

use anyhow::Result;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::{AiConfig, AiTestMode};
use crate::feed::types::Feed;

pub use backend::{
    BackendSummarizer, BoxFuture, CompletionProvider, FailingProvider, MockProvider,
    OpenAiProvider, Sampling,
};
pub use fallback::fallback_analysis;

/// Which path produced the text. Diagnostic only; the text is never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    Backend,
    Template,
}

impl AnalysisSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisSource::Backend => "backend",
            AnalysisSource::Template => "template",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
    pub source: AnalysisSource,
}

/// Feed in, non-empty text out. Implementations must not fail.
///
/// `stale` is the verdict already computed for this feed, so a backend can
/// caveat its commentary without guessing the current time.
pub trait Summarizer: Send + Sync {
    fn summarize<'a>(&'a self, feed: &'a Feed, stale: bool) -> BoxFuture<'a, Analysis>;
    /// Provider name for diagnostics/logs.
    fn name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

pub struct TemplateSummarizer;

impl Summarizer for TemplateSummarizer {
    fn summarize<'a>(&'a self, feed: &'a Feed, _stale: bool) -> BoxFuture<'a, Analysis> {
        counter!("analysis_summary_total", "source" => "template").increment(1);
        let text = fallback_analysis(feed);
        Box::pin(async move {
            Analysis {
                text,
                source: AnalysisSource::Template,
            }
        })
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "analysis_summary_total",
            "Summaries produced, by source (backend, template)."
        );
    });
}

/// Factory, decided once at boot:
///
/// * `test_mode = mock`  → backend summarizer over a fixed-text provider
/// * `test_mode = error` → backend summarizer over a provider that always fails
/// * API key present     → backend summarizer over OpenAI
/// * otherwise           → template summarizer
pub fn build_summarizer(cfg: &AiConfig) -> Result<DynSummarizer> {
    ensure_metrics_described();

    let summarizer: DynSummarizer = match cfg.test_mode {
        Some(AiTestMode::Mock) => Arc::new(BackendSummarizer::new(
            MockProvider::default(),
            cfg.clone(),
        )),
        Some(AiTestMode::Error) => Arc::new(BackendSummarizer::new(FailingProvider, cfg.clone())),
        None if cfg.api_key.is_some() => Arc::new(BackendSummarizer::new(
            OpenAiProvider::new(cfg)?,
            cfg.clone(),
        )),
        None => Arc::new(TemplateSummarizer),
    };

    tracing::info!(
        target: "summary",
        summarizer = summarizer.name(),
        model = %cfg.model,
        "summarizer selected"
    );
    Ok(summarizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_picks_variant_from_config() {
        let none = build_summarizer(&AiConfig::default()).unwrap();
        assert_eq!(none.name(), "template");

        let keyed = AiConfig {
            api_key: Some("sk-test".into()),
            ..AiConfig::default()
        };
        assert_eq!(build_summarizer(&keyed).unwrap().name(), "openai");

        let mock = AiConfig {
            test_mode: Some(AiTestMode::Mock),
            ..AiConfig::default()
        };
        assert_eq!(build_summarizer(&mock).unwrap().name(), "mock");

        // test mode wins over a real key
        let err = AiConfig {
            test_mode: Some(AiTestMode::Error),
            api_key: Some("sk-test".into()),
            ..AiConfig::default()
        };
        assert_eq!(build_summarizer(&err).unwrap().name(), "failing");
    }

    #[tokio::test]
    async fn template_summarizer_returns_fallback_verbatim() {
        let feed = Feed::default();
        let out = TemplateSummarizer.summarize(&feed, true).await;
        assert_eq!(out.source, AnalysisSource::Template);
        assert_eq!(out.text, fallback_analysis(&feed));
        assert!(!out.text.is_empty());
    }
}
