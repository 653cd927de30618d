//! Common utility functions shared across CLI commands.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use freshx_core::history::{parse_timestamp, status_label, HistoryCollection};
use freshx_core::{ClientConfig, HttpInferenceClient, InferenceService};
use tracing::debug;

/// Build the HTTP client for the configured service.
pub fn connect(config: ClientConfig) -> Result<HttpInferenceClient> {
    debug!(api_url = %config.api_url, "Connecting to inference service");
    HttpInferenceClient::new(config).context("Failed to create inference client")
}

/// Fetch the stored history as a collection.
pub async fn fetch_history(client: &HttpInferenceClient) -> Result<HistoryCollection> {
    let records = client
        .fetch_history()
        .await
        .context("Failed to load history")?;
    Ok(HistoryCollection::new(records))
}

/// Format a record timestamp as a human-readable UTC string.
///
/// Unparsable timestamps are shown as received.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => raw.to_string(),
    }
}

/// "Fresh" in green or "Rotten" in red.
pub fn colored_status(is_fresh: bool) -> ColoredString {
    let label = status_label(is_fresh);
    if is_fresh {
        label.green().bold()
    } else {
        label.red().bold()
    }
}

/// Ask a yes/no question on stderr. Anything but `y`/`yes` is a no.
pub fn confirm(prompt: &str) -> Result<bool> {
    let stdin = std::io::stdin();
    confirm_from(prompt, &mut stdin.lock())
}

fn confirm_from(prompt: &str, input: &mut impl BufRead) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush().ok();

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
