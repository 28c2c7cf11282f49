// src/config/mod.rs
//! Boot-time configuration.
//!
//! Layering, lowest precedence first:
//! 1) cadence profile defaults (`hourly` unless `FEED_CADENCE` / file says otherwise)
//! 2) config file: `$ANALYSIS_CONFIG_PATH`, else `config/analysis.toml`, else `config/analysis.json`
//! 3) environment variables
//!
//! The result is immutable and handed to constructors; nothing below reads env ad hoc.

pub mod ai;
pub mod feed;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use ai::{AiConfig, AiTestMode};
pub use feed::{Cadence, FeedConfig};

pub const ENV_CONFIG_PATH: &str = "ANALYSIS_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub feed: FeedConfig,
    pub ai: AiConfig,
}

impl AnalysisConfig {
    /// Defaults for a cadence profile, before any file or env overrides.
    pub fn for_cadence(cadence: Cadence) -> Self {
        Self {
            feed: FeedConfig::for_cadence(cadence),
            ai: AiConfig::for_cadence(cadence),
        }
    }

    /// Full boot path: profile defaults, then the config file (if any), then env.
    pub fn load() -> Result<Self> {
        let file = load_file_default()?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit file path.
    pub fn load_with_file(path: &Path) -> Result<Self> {
        let file = load_file_from(path)?;
        Self::resolve(Some(file), |key| std::env::var(key).ok())
    }

    /// Merge layers. `env` is injectable so tests don't have to touch the process env.
    pub fn resolve<F>(file: Option<ConfigFile>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();

        // Cadence decides the defaults, so it has to be settled first.
        let cadence = match non_empty(env("FEED_CADENCE")) {
            Some(raw) => raw.parse::<Cadence>()?,
            None => file.feed.cadence.unwrap_or_default(),
        };

        let mut cfg = Self::for_cadence(cadence);
        cfg.feed.apply_file(&file.feed);
        cfg.ai.apply_file(&file.ai);
        cfg.feed.apply_env(&env)?;
        cfg.ai.apply_env(&env)?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let h = self.feed.stale_after_hours;
        if !h.is_finite() || h < 0.0 {
            bail!("stale_after_hours must be a finite, non-negative number (got {h})");
        }
        if self.feed.cache_max_age_secs == 0 {
            bail!("cache_max_age_secs must be greater than zero");
        }
        let t = self.ai.temperature;
        if !t.is_finite() || !(0.0..=2.0).contains(&t) {
            bail!("temperature must be within 0.0..=2.0 (got {t})");
        }
        if self.ai.max_tokens == 0 {
            bail!("max_tokens must be greater than zero");
        }
        if self.ai.snapshot_limit_bytes == 0 {
            bail!("snapshot_limit_bytes must be greater than zero");
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::for_cadence(Cadence::default())
    }
}

/// On-disk shape. Every field optional; absent means "keep the profile default".
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub feed: feed::FeedFile,
    pub ai: ai::AiFile,
}

/// Load a config file from an explicit path. TOML or JSON.
pub fn load_file_from(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading analysis config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_file(&content, &ext).with_context(|| format!("parsing {}", path.display()))
}

/// Load using env var + fallbacks:
/// 1) $ANALYSIS_CONFIG_PATH (must exist)
/// 2) config/analysis.toml
/// 3) config/analysis.json
pub fn load_file_default() -> Result<Option<ConfigFile>> {
    if let Some(p) = non_empty(std::env::var(ENV_CONFIG_PATH).ok()) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
        }
        return load_file_from(&pb).map(Some);
    }
    for candidate in ["config/analysis.toml", "config/analysis.json"] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_file_from(&pb).map(Some);
        }
    }
    Ok(None)
}

fn parse_file(s: &str, hint_ext: &str) -> Result<ConfigFile> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            // No usable extension: JSON documents start with '{'.
            if s.trim_start().starts_with('{') {
                Ok(serde_json::from_str(s)?)
            } else {
                toml::from_str(s).map_err(|e| anyhow!("unsupported config format: {e}"))
            }
        }
    }
}

/// Treat unset and blank env values the same.
pub(crate) fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional env value, naming the variable in the error.
pub(crate) fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(env(key)) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}={raw:?}: {e}")),
    }
}
