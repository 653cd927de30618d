//! Export command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use freshx_core::{to_csv, ClientConfig};
use tracing::info;

use crate::utils::{connect, fetch_history};

/// Execute the export command. An empty history writes nothing.
pub async fn execute(config: ClientConfig, output: PathBuf, quiet: bool) -> Result<()> {
    let client = connect(config)?;
    let history = fetch_history(&client).await?;

    let Some(csv) = to_csv(&history) else {
        if !quiet {
            println!("No history to export.");
        }
        return Ok(());
    };

    std::fs::write(&output, csv)
        .with_context(|| format!("Failed to write export: {}", output.display()))?;

    info!(path = %output.display(), records = history.len(), "History exported");
    if !quiet {
        println!(
            "{} {} records to {}",
            "Exported".green(),
            history.len(),
            output.display()
        );
    }
    Ok(())
}
