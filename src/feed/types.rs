// src/feed/types.rs
//! Feed schema.
//!
//! The upstream document is loosely typed. Top-level sections are kept as the
//! raw JSON they arrived as, so the response can echo them untouched, and
//! typed views (`metrics()`, `positive_drivers()`) are read from them on
//! demand. A value of the wrong JSON type reads as absent instead of failing
//! the whole feed.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SENTIMENT: f64 = 0.5;
pub const DEFAULT_CONFIDENCE: f64 = 0.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
    /// Raw `summary` object: metrics plus whatever else upstream reports (counts, ...).
    #[serde(
        default,
        deserialize_with = "lenient_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<Map<String, Value>>,
    /// Raw `drivers` object; `positive` / `negative` hold the item lists.
    #[serde(
        default,
        deserialize_with = "lenient_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub drivers: Option<Map<String, Value>>,
    #[serde(
        default,
        deserialize_with = "lenient_array",
        skip_serializing_if = "Option::is_none"
    )]
    pub history: Option<Vec<Value>>,
    /// Everything else upstream sends (version, notes, market indicators, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed view of one driver item. Only used to quote titles; the response
/// echoes the raw item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Driver {
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: Option<f64>,
}

/// Sentiment metrics after default resolution. Missing values read as
/// "uncertain" (neutral sentiment, zero confidence), never as a strong signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentMetrics {
    pub combined: f64,
    pub crypto: f64,
    pub global: f64,
    pub confidence: f64,
}

impl Default for SentimentMetrics {
    fn default() -> Self {
        Self {
            combined: DEFAULT_SENTIMENT,
            crypto: DEFAULT_SENTIMENT,
            global: DEFAULT_SENTIMENT,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl Feed {
    /// Decode a raw feed document.
    ///
    /// Fails when the body isn't a JSON object, or when serde_json can't read
    /// it at all (syntax errors, numbers outside the f64 range such as `1e400`).
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn metrics(&self) -> SentimentMetrics {
        let d = SentimentMetrics::default();
        let Some(s) = &self.summary else {
            return d;
        };
        let num = |key: &str, default: f64| s.get(key).and_then(Value::as_f64).unwrap_or(default);
        SentimentMetrics {
            combined: num("combined_sentiment", d.combined),
            crypto: num("crypto_sentiment", d.crypto),
            global: num("global_sentiment", d.global),
            confidence: num("confidence", d.confidence),
        }
    }

    pub fn positive_drivers(&self) -> Vec<Driver> {
        self.driver_items("positive")
    }

    pub fn negative_drivers(&self) -> Vec<Driver> {
        self.driver_items("negative")
    }

    /// Raw item list of one side, or `None` when it isn't an array.
    pub fn raw_drivers(&self, side: &str) -> Option<&Vec<Value>> {
        self.drivers.as_ref()?.get(side)?.as_array()
    }

    /// Object entries in order; anything else is skipped.
    fn driver_items(&self, side: &str) -> Vec<Driver> {
        self.raw_drivers(side)
            .map(|items| {
                items
                    .iter()
                    .filter(|v| v.is_object())
                    .filter_map(|v| Driver::deserialize(v).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ------------------------------------------------------------
// Lenient field decoders
// ------------------------------------------------------------

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_string(d)?.unwrap_or_default())
}

fn lenient_object<'de, D>(d: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

fn lenient_array<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Value>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(items),
        _ => None,
    })
}
