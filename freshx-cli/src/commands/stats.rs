//! Stats command implementation.

use anyhow::Result;
use colored::Colorize;
use freshx_core::history::analytics::{model_indicator, MIN_RECORDS_FOR_ANALYTICS};
use freshx_core::history::format_confidence;
use freshx_core::{ClientConfig, HistoryAnalytics};
use serde_json::json;

use crate::utils::{connect, fetch_history};
use crate::OutputFormat;

const BAR_WIDTH: f64 = 30.0;

fn bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 100.0) / 100.0 * BAR_WIDTH).round() as usize;
    "█".repeat(filled)
}

/// Execute the stats command.
pub async fn execute(config: ClientConfig, format: OutputFormat) -> Result<()> {
    let default_model = config.default_model.clone();
    let client = connect(config)?;
    let history = fetch_history(&client).await?;

    let model = model_indicator(None, &history, &default_model);
    let analytics = HistoryAnalytics::compute(&history);

    if format == OutputFormat::Json {
        let output = match &analytics {
            Some(a) => json!({
                "records": history.len(),
                "model": model,
                "fresh": a.ratio.fresh,
                "rotten": a.ratio.rotten,
                "fresh_percent": a.ratio.fresh_percent(),
                "trend": a.trend.iter().map(|p| json!({
                    "index": p.index,
                    "confidence": p.confidence,
                    "status": p.status,
                })).collect::<Vec<_>>(),
            }),
            None => json!({
                "records": history.len(),
                "model": model,
                "analytics": null,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("   {} {}", "Model:".dimmed(), model);

    let Some(analytics) = analytics else {
        println!(
            "Not enough history for analytics (need at least {MIN_RECORDS_FOR_ANALYTICS} records)."
        );
        return Ok(());
    };

    let ratio = analytics.ratio;
    println!(
        "   {} {} fresh / {} rotten ({:.1}% fresh)",
        "Quality:".dimmed(),
        ratio.fresh.to_string().green(),
        ratio.rotten.to_string().red(),
        ratio.fresh_percent()
    );
    println!();
    println!("{}", "Confidence trend (oldest first)".bold());
    for point in &analytics.trend {
        let line = format!("{:<30}", bar(point.confidence));
        let line = if point.status == "Fresh" {
            line.green()
        } else {
            line.red()
        };
        println!(
            "   {:>2}  {}  {:>6}  {}",
            point.index,
            line,
            format_confidence(point.confidence),
            point.status
        );
    }
    Ok(())
}
