//! Summary figures behind the history dashboard.

use super::collection::HistoryCollection;
use super::record::{status_label, Prediction};

/// Number of points shown in the confidence trend.
pub const TREND_LENGTH: usize = 10;

/// Minimum number of records before analytics are shown.
pub const MIN_RECORDS_FOR_ANALYTICS: usize = 2;

/// Fresh vs rotten counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRatio {
    pub fresh: usize,
    pub rotten: usize,
}

impl QualityRatio {
    pub fn total(&self) -> usize {
        self.fresh + self.rotten
    }

    /// Share of fresh records in percent.
    pub fn fresh_percent(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.fresh as f64 * 100.0 / self.total() as f64
        }
    }
}

/// One point of the confidence trend.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// 1-based position, oldest first
    pub index: usize,
    pub confidence: f64,
    pub status: &'static str,
}

/// Dashboard figures for a history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryAnalytics {
    pub ratio: QualityRatio,
    pub trend: Vec<TrendPoint>,
}

impl HistoryAnalytics {
    /// Compute analytics; `None` when fewer than two records exist.
    pub fn compute(history: &HistoryCollection) -> Option<Self> {
        if history.len() < MIN_RECORDS_FOR_ANALYTICS {
            return None;
        }

        let fresh = history.iter().filter(|r| r.is_fresh).count();
        let ratio = QualityRatio {
            fresh,
            rotten: history.len() - fresh,
        };

        // History is newest first; the trend reads oldest to newest.
        let skip = history.len().saturating_sub(TREND_LENGTH);
        let trend = history
            .iter()
            .rev()
            .skip(skip)
            .enumerate()
            .map(|(i, r)| TrendPoint {
                index: i + 1,
                confidence: r.confidence,
                status: status_label(r.is_fresh),
            })
            .collect();

        Some(Self { ratio, trend })
    }
}

/// Split of a single prediction into match and remainder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBreakdown {
    pub matched: f64,
    pub remainder: f64,
}

impl ConfidenceBreakdown {
    pub fn of(prediction: &Prediction) -> Self {
        let matched = prediction.confidence.clamp(0.0, 100.0);
        Self {
            matched,
            remainder: 100.0 - matched,
        }
    }
}

/// Model shown in the scanner header: latest result, else newest history
/// entry, else the default.
pub fn model_indicator<'a>(
    result: Option<&'a Prediction>,
    history: &'a HistoryCollection,
    default_model: &'a str,
) -> &'a str {
    result
        .and_then(|p| p.model_used.as_deref())
        .or_else(|| history.first().map(|r| r.model_used.as_str()))
        .unwrap_or(default_model)
}
