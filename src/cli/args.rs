//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bird species image classifier with a web upload form.
///
/// Without a subcommand, starts the web interface.
#[derive(Debug, Parser)]
#[command(name = "birdlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options shared by every command.
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the web interface (default).
    Serve,
    /// Classify image files and print ranked species.
    Classify {
        /// Image files to classify.
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Number of ranked species to print per image.
        #[arg(short = 'k', long, default_value_t = crate::constants::DEFAULT_TOP_K)]
        top_k: usize,
        /// Print the full label set as JSON instead of a ranked summary.
        #[arg(long)]
        json: bool,
    },
    /// Print the model's label set.
    Labels,
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Options that override the configuration file.
#[derive(Debug, Default, Args)]
pub struct CommonArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "BIRDLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to ONNX model file.
    #[arg(short, long, global = true, env = "BIRDLENS_MODEL")]
    pub model: Option<PathBuf>,

    /// Path to labels file.
    #[arg(short, long, global = true, env = "BIRDLENS_LABELS")]
    pub labels: Option<PathBuf>,

    /// Host to bind the web interface to.
    #[arg(long, global = true, env = "BIRDLENS_HOST")]
    pub host: Option<String>,

    /// Port to bind the web interface to.
    #[arg(short, long, global = true, env = "BIRDLENS_PORT")]
    pub port: Option<u16>,

    /// Directory with example images.
    #[arg(long, global = true, env = "BIRDLENS_EXAMPLES_DIR")]
    pub examples_dir: Option<PathBuf>,

    /// Require CUDA GPU acceleration.
    #[arg(long, global = true, conflicts_with = "cpu")]
    pub gpu: bool,

    /// Force CPU inference.
    #[arg(long, global = true, conflicts_with = "gpu")]
    pub cpu: bool,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: full trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
