//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// artifact-cache - process-safe local cache for HTTP artifacts
///
/// Downloads each URL once, verifies an optional sha256 query parameter,
/// decompresses known formats and prints the local path.
#[derive(Parser, Debug)]
#[command(name = "artifact-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress and status output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ARTIFACT_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the cache root directory
    #[arg(long, global = true, env = "ARTIFACT_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a URL into the cache (if needed) and print its local path
    Fetch(FetchArgs),

    /// Download an OS image into the image category and print its local path
    Image(ImageArgs),

    /// Print (and create) the directory of a cache category
    Path(PathArgs),

    /// List completed entries of a cache category
    List(ListArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL; a sha256 query parameter is verified against the download
    pub url: String,

    /// Cache category (directory-safe label)
    #[arg(short = 't', long, default_value = "generic")]
    pub category: String,
}

/// Arguments for the image command
#[derive(Parser, Debug)]
pub struct ImageArgs {
    /// Absolute URL of the image
    pub url: String,
}

/// Arguments for the path command
#[derive(Parser, Debug)]
pub struct PathArgs {
    /// Cache category
    pub category: String,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Cache category
    pub category: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one path per line)
    Plain,
}
