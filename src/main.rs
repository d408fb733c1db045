//! Recorder
//!
//! Command-line entry point for the page recorder and suggestion sync.

mod cli;
mod cmd_record;
mod cmd_suggest;
mod cmd_sync;
mod context;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::context::{recorder_dir, AppContext};

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.recorder/logs/ with daily rotation. Console
/// output goes to stderr so command output on stdout stays parseable.
fn init_tracing() -> Result<()> {
    let log_dir = recorder_dir().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("recorder")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)
        .context("Failed to create log file appender")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let ctx = AppContext::open(&cli.config, cli.state_dir).await?;

    match cli.command {
        Commands::Sync { once } => cmd_sync::handle_sync(ctx, once).await,
        Commands::Status => cmd_record::handle_status(&ctx).await,
        Commands::Record { mode } => cmd_record::handle_record(&ctx, mode).await,
        Commands::Export => cmd_record::handle_export(&ctx).await,
        Commands::Clear => cmd_record::handle_clear(&ctx).await,
        Commands::Suggest { html_file, url } => {
            cmd_suggest::handle_suggest(ctx, &html_file, url).await
        }
    }
}
