//! History command implementation.

use anyhow::Result;
use colored::Colorize;
use freshx_core::history::format_confidence;
use freshx_core::{ClientConfig, HistoryFilter, PredictionRecord, StatusFilter};

use crate::utils::{colored_status, connect, fetch_history, format_timestamp};
use crate::OutputFormat;

/// Execute the history command.
pub async fn execute(
    config: ClientConfig,
    search: Option<String>,
    status: StatusFilter,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let client = connect(config)?;
    let history = fetch_history(&client).await?;

    let filter = HistoryFilter::new(search.unwrap_or_default(), status);
    let visible = history.filter(&filter);
    let shown: Vec<&PredictionRecord> = visible.iter().take(limit.unwrap_or(usize::MAX)).collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    if shown.is_empty() {
        println!("No records match the filter.");
        return Ok(());
    }

    for record in &shown {
        println!(
            "{}  {}  {:>6}  {} [{}]  {}",
            record.id.as_str().dimmed(),
            format_timestamp(&record.timestamp),
            format_confidence(record.confidence),
            record.label.bold(),
            colored_status(record.is_fresh),
            record.filename.dimmed()
        );
    }

    println!();
    println!(
        "{}",
        format!("{} of {} records", shown.len(), history.len()).dimmed()
    );
    Ok(())
}
