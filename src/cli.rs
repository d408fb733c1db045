//! CLI definitions for the recorder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Recorder CLI.
#[derive(Parser)]
#[command(name = "recorder")]
#[command(about = "Web interaction recorder and suggestion sync")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true, env = "RECORDER_CONFIG")]
    pub config: PathBuf,

    /// Override the state directory from the configuration
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Drain queued confirmations, periodically until Ctrl-C
    Sync {
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },

    /// Show recording and queue state
    Status,

    /// Turn recording on, or off and send the action log
    Record {
        #[arg(value_enum)]
        mode: RecordMode,
    },

    /// Print the action log as JSON
    Export,

    /// Discard the action log
    Clear,

    /// Request suggestions for a saved page
    Suggest {
        /// HTML file to send
        html_file: PathBuf,

        /// Page URL recorded with the suggestions
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum RecordMode {
    On,
    Off,
}
