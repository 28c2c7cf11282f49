// src/config/ai.rs
use anyhow::{bail, Result};
use serde::Deserialize;
use std::str::FromStr;

use super::feed::Cadence;
use super::{non_empty, parse_env};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SYSTEM_PROMPT: &str = "You write concise factual crypto market commentary.";

const HOURLY_INSTRUCTIONS: &str = "You are a crypto markets analyst. Given a JSON market sentiment feed, produce a concise analysis of 2 to 5 sentences. Be specific and avoid hype.
- Emphasize combined sentiment (0..1), confidence, and notable drivers
- If the `stale` line says true, say the source data may be out of date
- Keep it factual and brief";

const TWELVE_HOURLY_INSTRUCTIONS: &str = "You are a crypto markets analyst writing a twice-daily briefing. Given a JSON market sentiment feed covering roughly the last 12 hours, produce a concise analysis of 2 to 5 sentences. Be specific and avoid speculation or hype.
- Lead with combined sentiment (0..1) and its confidence
- Name the most notable positive and negative drivers
- If the `stale` line says true, say plainly that the data may be out of date
- Keep it factual";

/// Deterministic backends for exercising the pipeline without a real provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTestMode {
    /// Fixed commentary, no network.
    Mock,
    /// Every call fails; the template fallback must take over.
    Error,
}

impl FromStr for AiTestMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(AiTestMode::Mock),
            "error" => Ok(AiTestMode::Error),
            other => bail!("unknown AI_TEST_MODE {other:?} (expected mock|error)"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct AiConfig {
    /// Backend credential. `None` selects the template summarizer.
    pub api_key: Option<String>,
    pub model: String,
    /// OpenAI-compatible API root, without the trailing `/chat/completions`.
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on the serialized feed embedded in the prompt.
    pub snapshot_limit_bytes: usize,
    pub system_prompt: String,
    pub instructions: String,
    pub test_mode: Option<AiTestMode>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl AiConfig {
    pub fn for_cadence(cadence: Cadence) -> Self {
        let (max_tokens, temperature, snapshot_limit_bytes, instructions) = match cadence {
            Cadence::Hourly => (220, 0.3, 20_000, HOURLY_INSTRUCTIONS),
            Cadence::TwelveHourly => (300, 0.4, 15_000, TWELVE_HOURLY_INSTRUCTIONS),
        };
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens,
            temperature,
            snapshot_limit_bytes,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            instructions: instructions.to_string(),
            test_mode: None,
            connect_timeout_secs: 4,
            request_timeout_secs: 10,
        }
    }

    /// True when a real or test backend should be used instead of the template.
    pub fn backend_enabled(&self) -> bool {
        self.test_mode.is_some() || self.api_key.is_some()
    }

    pub(crate) fn apply_file(&mut self, f: &AiFile) {
        if let Some(v) = non_empty(f.model.clone()) {
            self.model = v;
        }
        if let Some(v) = non_empty(f.base_url.clone()) {
            self.base_url = v;
        }
        if let Some(v) = f.max_tokens {
            self.max_tokens = v;
        }
        if let Some(v) = f.temperature {
            self.temperature = v;
        }
        if let Some(v) = f.snapshot_limit_bytes {
            self.snapshot_limit_bytes = v;
        }
        if let Some(v) = non_empty(f.system_prompt.clone()) {
            self.system_prompt = v;
        }
        if let Some(v) = non_empty(f.instructions.clone()) {
            self.instructions = v;
        }
        if let Some(v) = f.connect_timeout_secs {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = f.request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }

    /// The key is env-only; it never lives in the config file.
    pub(crate) fn apply_env<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = non_empty(env("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(v) = non_empty(env("AI_MODEL")) {
            self.model = v;
        }
        if let Some(v) = non_empty(env("AI_BASE_URL")) {
            self.base_url = v;
        }
        if let Some(v) = parse_env::<u32, _>(env, "AI_MAX_TOKENS")? {
            self.max_tokens = v;
        }
        if let Some(v) = parse_env::<f32, _>(env, "AI_TEMPERATURE")? {
            self.temperature = v;
        }
        if let Some(v) = parse_env::<AiTestMode, _>(env, "AI_TEST_MODE")? {
            self.test_mode = Some(v);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::for_cadence(Cadence::default())
    }
}

// Manual Debug so the key never reaches logs; only its length.
impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("key_len", &self.api_key.as_ref().map(|k| k.len()).unwrap_or(0))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("snapshot_limit_bytes", &self.snapshot_limit_bytes)
            .field("test_mode", &self.test_mode)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AiFile {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub snapshot_limit_bytes: Option<usize>,
    pub system_prompt: Option<String>,
    pub instructions: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}
