//! Command-line interface for signseq
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Gesture sequence segmentation for sign-language recognition
#[derive(Parser, Debug)]
#[command(
    name = "signseq",
    version,
    about = "Gesture sequence segmentation for sign-language recognition"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: commits and sessions, -vv: every frame)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon (foreground process for systemd)
    Daemon {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/signseq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Get daemon status via IPC
    Status {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/signseq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Run a recorded observation log (JSON Lines) through the live segmenter
    Replay {
        /// Observation log, one {"label", "confidence", "offset_ms"} per line
        file: PathBuf,

        /// Print only frames that commit, reset or complete
        #[arg(long)]
        transitions_only: bool,
    },

    /// Aggregate a recorded observation log as one clip
    Aggregate {
        /// Observation log, one {"label", "confidence", "offset_ms"} per line
        file: PathBuf,
    },

    /// Stream a recorded observation log to the daemon as one session
    Send {
        /// Observation log, one {"label", "confidence", "offset_ms"} per line
        file: PathBuf,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/signseq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Dump the default configuration as TOML
    Dump,
    /// Print the effective configuration (file + environment)
    Show,
    /// Print the default configuration file path
    Path,
}
