//! FreshX CLI - fruit freshness classification from the terminal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use freshx_core::history::EXPORT_FILENAME;
use freshx_core::{ClientConfig, StatusFilter};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage or configuration error
  65  Prediction rejected or malformed response
  66  Input file missing or no input selected
  69  Inference service or camera unavailable
  74  Failed to write output file
  77  Camera permission denied";

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored output
    Text,
    /// JSON on stdout
    Json,
}

#[derive(Parser)]
#[command(name = "freshx")]
#[command(author, version, about = "Fruit freshness classifier client", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Base URL of the inference service
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an image file or a camera still
    Predict {
        /// Image files; the first one is uploaded
        #[arg(value_name = "FILE", conflicts_with = "camera")]
        files: Vec<PathBuf>,

        /// Capture from a camera snapshot file kept fresh by a frame grabber
        #[arg(long, value_name = "SNAPSHOT")]
        camera: Option<PathBuf>,

        /// Minimum time a prediction takes, in milliseconds
        #[arg(long, value_name = "MS")]
        min_delay_ms: Option<u64>,
    },

    /// List stored predictions, newest first
    History {
        /// Case-insensitive search on label and filename
        #[arg(short, long)]
        search: Option<String>,

        /// Only show fresh or rotten records
        #[arg(long, default_value = "all", value_name = "all|fresh|rotten")]
        status: StatusFilter,

        /// Show at most this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Delete one stored prediction
    Delete {
        /// Record identifier
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete every stored prediction
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the history as CSV
    Export {
        /// Output path
        #[arg(short, long, default_value = EXPORT_FILENAME)]
        output: PathBuf,
    },

    /// Show the fresh/rotten ratio and confidence trend
    Stats,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("freshx=debug,freshx_core=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(api_url: Option<&str>) -> Result<ClientConfig> {
    let config = ClientConfig::from_env().context("Invalid environment configuration")?;
    match api_url {
        Some(url) => config.with_api_url(url).context("Invalid --api-url"),
        None => Ok(config),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.api_url.as_deref())?;
    let format = cli.format;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Predict {
            files,
            camera,
            min_delay_ms,
        } => commands::predict::execute(config, files, camera, min_delay_ms, format, quiet).await,
        Commands::History {
            search,
            status,
            limit,
        } => commands::history::execute(config, search, status, limit, format).await,
        Commands::Delete { id } => commands::manage::delete(config, id, quiet).await,
        Commands::Clear { yes } => commands::manage::clear(config, yes, quiet).await,
        Commands::Export { output } => commands::export::execute(config, output, quiet).await,
        Commands::Stats => commands::stats::execute(config, format).await,
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            return std::process::ExitCode::from(code as u8);
        }
    };

    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => exit_codes::ExitCode::success(),
        Err(err) => exit_codes::ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::ExitCode::from(exit.code as u8)
}
