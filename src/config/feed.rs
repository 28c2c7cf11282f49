// src/config/feed.rs
use anyhow::{bail, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::{non_empty, parse_env};

/// Expected refresh interval of the upstream feed.
/// Drives the staleness threshold and the cache lifetime together.
/// Parsed through [`FromStr`] everywhere, so the config file and `FEED_CADENCE`
/// accept the same spellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Cadence {
    #[default]
    Hourly,
    TwelveHourly,
}

impl Cadence {
    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Hourly => "hourly",
            Cadence::TwelveHourly => "twelve_hourly",
        }
    }

    /// Freshness lifetime for shared caches (`s-maxage`).
    pub fn cadence_secs(self) -> u64 {
        match self {
            Cadence::Hourly => 3_600,
            Cadence::TwelveHourly => 43_200,
        }
    }

    /// Grace window during which a stale response may still be served.
    pub fn grace_secs(self) -> u64 {
        match self {
            Cadence::Hourly => 60,
            Cadence::TwelveHourly => 600,
        }
    }

    /// Several multiples of the cadence so upstream delay doesn't flap the verdict.
    pub fn stale_after_hours(self) -> f64 {
        match self {
            Cadence::Hourly => 2.5,
            Cadence::TwelveHourly => 30.0,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Cadence {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl FromStr for Cadence {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" | "1h" => Ok(Cadence::Hourly),
            "twelve_hourly" | "12h" => Ok(Cadence::TwelveHourly),
            other => bail!("unknown feed cadence {other:?} (expected hourly|1h|twelve_hourly|12h)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Feed location. `None` means the feed is treated as unavailable without any I/O.
    pub url: Option<String>,
    pub cadence: Cadence,
    pub stale_after_hours: f64,
    pub cache_max_age_secs: u64,
    pub stale_while_revalidate_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl FeedConfig {
    pub fn for_cadence(cadence: Cadence) -> Self {
        Self {
            url: None,
            cadence,
            stale_after_hours: cadence.stale_after_hours(),
            cache_max_age_secs: cadence.cadence_secs(),
            stale_while_revalidate_secs: cadence.grace_secs(),
            connect_timeout_secs: 4,
            request_timeout_secs: 10,
        }
    }

    pub(crate) fn apply_file(&mut self, f: &FeedFile) {
        if let Some(url) = non_empty(f.url.clone()) {
            self.url = Some(url);
        }
        if let Some(v) = f.stale_after_hours {
            self.stale_after_hours = v;
        }
        if let Some(v) = f.cache_max_age_secs {
            self.cache_max_age_secs = v;
        }
        if let Some(v) = f.stale_while_revalidate_secs {
            self.stale_while_revalidate_secs = v;
        }
        if let Some(v) = f.connect_timeout_secs {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = f.request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }

    pub(crate) fn apply_env<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(env("FEED_URL")) {
            self.url = Some(url);
        }
        if let Some(v) = parse_env::<f64, _>(env, "FEED_STALE_AFTER_HOURS")? {
            self.stale_after_hours = v;
        }
        if let Some(v) = parse_env::<u64, _>(env, "CACHE_MAX_AGE_SECS")? {
            self.cache_max_age_secs = v;
        }
        if let Some(v) = parse_env::<u64, _>(env, "CACHE_STALE_WHILE_REVALIDATE_SECS")? {
            self.stale_while_revalidate_secs = v;
        }
        Ok(())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::for_cadence(Cadence::default())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FeedFile {
    pub url: Option<String>,
    pub cadence: Option<Cadence>,
    pub stale_after_hours: Option<f64>,
    pub cache_max_age_secs: Option<u64>,
    pub stale_while_revalidate_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}
