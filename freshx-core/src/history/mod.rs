//! Prediction history: records, the newest-first collection, filtering,
//! analytics and CSV export.
//!
//! Local history is optimistic. A successful prediction is prepended right
//! away with a `temp-` identifier; a later fetch from the remote store is
//! merged with [`HistoryCollection::reconcile`] so those entries are neither
//! lost nor duplicated.

pub mod analytics;
mod collection;
pub mod export;
mod filter;
mod record;

pub use analytics::{ConfidenceBreakdown, HistoryAnalytics, QualityRatio, TrendPoint};
pub use collection::{HistoryCollection, ReconcilePolicy, RECONCILE_WINDOW_SECS};
pub use export::{to_csv, EXPORT_FILENAME};
pub use filter::{HistoryFilter, StatusFilter};
pub use record::{
    format_confidence, parse_timestamp, status_label, Prediction, PredictionRecord, Provenance,
    RecordId, TEMP_ID_PREFIX,
};
