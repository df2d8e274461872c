//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Babycast - offspring portrait generation from two parent photos
#[derive(Parser, Debug)]
#[command(
    name = "babycast",
    author,
    version,
    about = "Generate offspring portraits and a trait analysis from two parent photos",
    long_about = "Sends two parent photos to an image generation backend, requests a short\n\
                  trait analysis followed by eight portraits (boy and girl at four ages),\n\
                  and streams each result as soon as it arrives."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BABYCAST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BABYCAST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the generation pipeline for two parent photos
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Print the fixed task table and the prompts sent to the backend
    Tasks(TasksArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// First parent photo (jpeg, png, webp, heic or heif)
    #[arg(long, env = "BABYCAST_PARENT1")]
    pub parent1: PathBuf,

    /// Second parent photo
    #[arg(long, env = "BABYCAST_PARENT2")]
    pub parent2: PathBuf,

    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "BABYCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the final result aggregate as JSON to this file
    #[arg(short, long, env = "BABYCAST_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Override the backend model from configuration
    #[arg(long, env = "BABYCAST_MODEL")]
    pub model: Option<String>,

    /// Override the pacing interval (milliseconds); may lengthen it but not go below 500
    #[arg(long, env = "BABYCAST_PACING_MS")]
    pub pacing_ms: Option<u64>,

    /// Use the in-process mock backend instead of the remote API
    #[arg(long)]
    pub mock: bool,

    /// With --mock: 0-based backend calls that should fail (0 = analysis)
    #[arg(long, value_delimiter = ',', requires = "mock")]
    pub mock_fail: Vec<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "BABYCAST_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "babycast.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `tasks` command
#[derive(Parser, Debug)]
pub struct TasksArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Include the full prompt text for every step
    #[arg(long)]
    pub prompts: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
