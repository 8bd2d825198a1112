mod export;
mod reshape;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vbetl")]
#[command(about = "Export and reshape video and webcast analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch active videos and their daily statistics
    Videos,
    /// Fetch scheduled events and their attendance reports
    Webcasts {
        /// Start of the event range (RFC 3339); defaults to the configured lookback
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// End of the event range (RFC 3339); defaults to now
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    /// Join per-video totals onto the webcast summary
    Merge {
        /// Video analytics CSV produced by `videos`
        #[arg(long)]
        videos: PathBuf,

        /// Webcast summary CSV produced by `webcasts`
        #[arg(long)]
        webcasts: PathBuf,

        #[arg(long)]
        out: PathBuf,

        /// Write fractional numbers with a decimal comma
        #[arg(long)]
        decimal_comma: bool,
    },
    /// Unfold one-hot count columns of a merged report into records
    Normalize {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        out: PathBuf,

        /// YAML dimension configuration; built-in defaults when omitted
        #[arg(long)]
        dimensions: Option<PathBuf>,
    },
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

/// Moves a finished report to the publish directory, logging any failure.
fn publish_best_effort(source: &Path, dir: Option<&Path>, file_name: &str) {
    let Some(dir) = dir else {
        return;
    };
    if let Err(e) = vbetl_report::publish(source, dir, file_name) {
        tracing::error!(
            source = %source.display(),
            error = %e,
            "failed to publish report, leaving it in place"
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Videos => {
            let config = vbetl_core::load_app_config()?;
            init_tracing(&config.log_level)?;
            export::run_videos(&config).await
        }
        Commands::Webcasts { from, to } => {
            let config = vbetl_core::load_app_config()?;
            init_tracing(&config.log_level)?;
            export::run_webcasts(&config, from, to).await
        }
        Commands::Merge {
            videos,
            webcasts,
            out,
            decimal_comma,
        } => {
            init_tracing(&reshape_log_level())?;
            reshape::run_merge(&videos, &webcasts, &out, decimal_comma)
        }
        Commands::Normalize {
            input,
            out,
            dimensions,
        } => {
            init_tracing(&reshape_log_level())?;
            reshape::run_normalize(&input, &out, dimensions.as_deref())
        }
    }
}

/// The reshape jobs need no secrets, so the level is read straight from the
/// environment.
fn reshape_log_level() -> String {
    std::env::var("VBETL_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}
