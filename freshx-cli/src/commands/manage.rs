//! Delete and clear commands.

use anyhow::{Context, Result};
use colored::Colorize;
use freshx_core::{ClientConfig, InferenceService, RecordId};
use tracing::info;

use crate::utils::{confirm, connect};

/// Delete one record. Local state is never touched unless the service agrees.
pub async fn delete(config: ClientConfig, id: String, quiet: bool) -> Result<()> {
    let client = connect(config)?;
    let id = RecordId::new(id);

    client
        .delete_record(&id)
        .await
        .with_context(|| format!("Failed to delete record {id}"))?;

    info!(id = %id, "Record deleted");
    if !quiet {
        println!("{} {}", "Deleted record".green(), id);
    }
    Ok(())
}

/// Delete every record after confirmation.
pub async fn clear(config: ClientConfig, yes: bool, quiet: bool) -> Result<()> {
    if !yes && !confirm("Delete all history? This cannot be undone.")? {
        if !quiet {
            eprintln!("{}", "Aborted.".yellow());
        }
        return Ok(());
    }

    let client = connect(config)?;
    client
        .clear_history()
        .await
        .context("Failed to clear history")?;

    info!("History cleared");
    if !quiet {
        println!("{}", "History cleared.".green());
    }
    Ok(())
}
