//! CSV export of the (unfiltered) history.

use super::collection::HistoryCollection;
use super::record::PredictionRecord;

/// Default download name.
pub const EXPORT_FILENAME: &str = "freshx_history_export.csv";

/// Column order of the export.
pub const CSV_HEADERS: [&str; 6] = [
    "Timestamp",
    "Filename",
    "Label",
    "Is Fresh",
    "Confidence",
    "Model",
];

/// Serialize history to CSV, one row per record in history order.
///
/// Returns `None` for an empty history. Lines are joined with `\n` and there
/// is no trailing newline.
pub fn to_csv(history: &HistoryCollection) -> Option<String> {
    if history.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(history.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    lines.extend(history.iter().map(row));
    Some(lines.join("\n"))
}

fn row(record: &PredictionRecord) -> String {
    let fields = [
        escape(&record.timestamp),
        escape(&record.filename),
        escape(&record.label),
        (if record.is_fresh { "Yes" } else { "No" }).to_string(),
        format!("{:.2}", record.confidence),
        escape(&record.model_used),
    ];
    fields.join(",")
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
