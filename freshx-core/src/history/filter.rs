//! Search and freshness filtering.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::record::PredictionRecord;

/// Freshness selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Fresh,
    Rotten,
}

impl StatusFilter {
    pub fn matches(self, is_fresh: bool) -> bool {
        match self {
            Self::All => true,
            Self::Fresh => is_fresh,
            Self::Rotten => !is_fresh,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "fresh" => Ok(Self::Fresh),
            "rotten" => Ok(Self::Rotten),
            other => Err(format!(
                "Unknown status filter '{other}' (expected all, fresh or rotten)"
            )),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Fresh => "fresh",
            Self::Rotten => "rotten",
        })
    }
}

/// Search term plus freshness selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    term: String,
    pub status: StatusFilter,
}

impl HistoryFilter {
    pub fn new(term: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            term: term.into().to_lowercase(),
            status,
        }
    }

    /// Lowercased search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Case-insensitive substring over label or filename, AND the status.
    pub fn matches(&self, record: &PredictionRecord) -> bool {
        let matches_search = self.term.is_empty()
            || record.label.to_lowercase().contains(&self.term)
            || record.filename.to_lowercase().contains(&self.term);

        matches_search && self.status.matches(record.is_fresh)
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty() && self.status == StatusFilter::All
    }
}
