use audiosplit_core::ShrinkPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Split long recordings into m4a chunks bounded by duration and file size
#[derive(Parser)]
#[command(name = "audiosplit", version, about)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub split: SplitArgs,

    /// Enable debug logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change the saved default limits
    Config(ConfigArgs),
}

#[derive(Args, Default)]
pub struct SplitArgs {
    /// Path to the input audio file
    pub input: Option<PathBuf>,

    /// Directory to save output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum duration in minutes for each chunk
    #[arg(long, value_name = "MINUTES")]
    pub max_duration: Option<u32>,

    /// Maximum file size in MB for each chunk
    #[arg(long, value_name = "MB")]
    pub max_size: Option<f64>,

    /// Keep shrinking oversized chunks until they fit (default: shrink once)
    #[arg(long)]
    pub converge: bool,

    /// AAC bitrate passed to ffmpeg, e.g. 96k
    #[arg(long)]
    pub bitrate: Option<String>,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the current settings as JSON
    #[arg(long)]
    pub show: bool,

    /// Restore built-in defaults before applying other flags
    #[arg(long)]
    pub reset: bool,

    /// Default output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Default maximum duration in minutes
    #[arg(long, value_name = "MINUTES")]
    pub max_duration: Option<u32>,

    /// Default maximum size in MB
    #[arg(long, value_name = "MB")]
    pub max_size: Option<f64>,

    /// Default shrink policy (once, converge)
    #[arg(long)]
    pub shrink_policy: Option<ShrinkPolicy>,

    /// Default AAC bitrate
    #[arg(long)]
    pub bitrate: Option<String>,
}
