//! Predict command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use freshx_core::capture::CAMERA_ACCESS_MESSAGE;
use freshx_core::history::{format_confidence, status_label, ConfidenceBreakdown};
use freshx_core::{Action, CaptureSource, ClientConfig, Controller, FreshxError, SnapshotCamera};
use serde_json::json;
use tracing::info;

use crate::utils::{colored_status, connect};
use crate::OutputFormat;

/// Execute the predict command.
pub async fn execute(
    mut config: ClientConfig,
    files: Vec<PathBuf>,
    camera: Option<PathBuf>,
    min_delay_ms: Option<u64>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    if let Some(ms) = min_delay_ms {
        config.min_predict_duration = Duration::from_millis(ms);
    }

    let client = connect(config.clone())?;
    // File uploads never open the device.
    let device = SnapshotCamera::new(camera.clone().unwrap_or_default());
    let mut controller = Controller::new(client, device, config);

    if camera.is_some() {
        controller.dispatch(Action::StartCamera).await;
        if let Some(error) = controller.take_error() {
            return Err(error).context(CAMERA_ACCESS_MESSAGE);
        }
    } else {
        let source = CaptureSource::first_of(&files).with_context(|| {
            let path = files.first().map(|p| p.display().to_string());
            format!("Failed to read file: {}", path.unwrap_or_default())
        })?;
        if let Some(source) = source {
            info!(
                filename = %source.filename,
                bytes = source.bytes.len(),
                kind = ?source.kind,
                "Acquired image"
            );
            controller.dispatch(Action::FileAcquired(source)).await;
        }
    }

    controller.dispatch(Action::Submit).await;
    let outcome = controller.session().result().cloned();
    let model = controller.session().model_indicator().to_string();
    let error = controller.take_error();
    controller.dispatch(Action::Teardown).await;

    let prediction = match (outcome, error) {
        (Some(prediction), _) => prediction,
        (None, Some(FreshxError::NoInputSelected)) | (None, None) => {
            return Err(FreshxError::NoInputSelected.into());
        }
        (None, Some(error)) => return Err(error).context("Prediction failed"),
    };

    let (filename, size) = match controller.last_upload() {
        Some(upload) => (
            upload.filename.clone(),
            upload
                .dimensions
                .map(|d| d.to_string())
                .unwrap_or_else(|| "original".to_string()),
        ),
        None => (String::new(), "original".to_string()),
    };

    match format {
        OutputFormat::Json => {
            let output = json!({
                "filename": filename,
                "label": prediction.label,
                "confidence": prediction.confidence,
                "is_fresh": prediction.is_fresh,
                "status": status_label(prediction.is_fresh),
                "model_used": model,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text if !quiet => {
            let breakdown = ConfidenceBreakdown::of(&prediction);

            println!();
            println!("   {} {}", "Result:".dimmed(), prediction.label.bold());
            println!("   {} {}", "Status:".dimmed(), colored_status(prediction.is_fresh));
            println!(
                "   {} {}",
                "Confidence:".dimmed(),
                format_confidence(prediction.confidence)
            );
            println!(
                "   {} {:.1}% match / {:.1}% other",
                "Breakdown:".dimmed(),
                breakdown.matched,
                breakdown.remainder
            );
            println!("   {} {}", "Model:".dimmed(), model);
            println!("   {} {} ({})", "Image:".dimmed(), filename, size);
        }
        OutputFormat::Text => {}
    }

    Ok(())
}
