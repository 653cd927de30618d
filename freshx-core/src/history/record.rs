//! Prediction records as stored by the remote history service.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;

/// Prefix of client-generated identifiers.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Identifier of a history record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Temporary identifier for an optimistic record.
    pub fn temporary(unix_millis: i64) -> Self {
        Self(format!("{TEMP_ID_PREFIX}{unix_millis}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn provenance(&self) -> Provenance {
        if self.0.starts_with(TEMP_ID_PREFIX) {
            Provenance::Optimistic
        } else {
            Provenance::Confirmed
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.provenance() == Provenance::Optimistic
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Whether the remote store is known to hold a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Durable identifier issued by the remote store
    Confirmed,
    /// Added locally after a prediction, not yet seen in a fetch
    Optimistic,
}

/// Successful `/predict` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Percentage in 0..=100
    pub confidence: f64,
    pub is_fresh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl Prediction {
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model_used.as_deref().unwrap_or(default)
    }
}

/// One history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub filename: String,
    pub label: String,
    pub confidence: f64,
    pub is_fresh: bool,
    /// ISO-8601 as produced by the store; kept verbatim
    pub timestamp: String,
    #[serde(default = "default_model")]
    pub model_used: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl PredictionRecord {
    /// Build the optimistic record for a prediction that just succeeded.
    pub fn optimistic(
        id: RecordId,
        filename: impl Into<String>,
        prediction: &Prediction,
        at: DateTime<Utc>,
        default_model: &str,
    ) -> Self {
        Self {
            id,
            filename: filename.into(),
            label: prediction.label.clone(),
            confidence: prediction.confidence,
            is_fresh: prediction.is_fresh,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            model_used: prediction.model_or(default_model).to_string(),
        }
    }

    pub fn provenance(&self) -> Provenance {
        self.id.provenance()
    }

    /// Parse the timestamp. Naive timestamps are read as UTC.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Confidence rounded to one decimal, e.g. `92.3%`.
    pub fn confidence_display(&self) -> String {
        format_confidence(self.confidence)
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.is_fresh)
    }
}

/// Format a confidence percentage with one decimal.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence.clamp(0.0, 100.0))
}

pub fn status_label(is_fresh: bool) -> &'static str {
    if is_fresh {
        "Fresh"
    } else {
        "Rotten"
    }
}

/// Parse RFC 3339 or naive ISO-8601 timestamps.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
