//! artifact-cache - process-safe local cache for HTTP artifacts
//!
//! CLI entry point that dispatches to subcommands.

use artifact_cache::cli::{commands, Cli, Commands};
use artifact_cache::config::{Config, ConfigManager};
use artifact_cache::error::CacheResult;
use artifact_cache::ui::UiContext;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("artifact_cache=warn"),
        1 => EnvFilter::new("artifact_cache=info"),
        _ => EnvFilter::new("artifact_cache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = manager.load()?;
    if let Some(root) = cli.cache_root.clone() {
        config.cache.root = Some(root);
    }

    init_logging(cli.verbose, &config);
    debug!("Using configuration at {}", manager.path().display());

    let ctx = UiContext::detect().with_quiet(cli.quiet);

    match cli.command {
        Commands::Fetch(args) => commands::fetch(args, &config, &ctx),
        Commands::Image(args) => commands::image(args, &config, &ctx),
        Commands::Path(args) => commands::path(args, &config),
        Commands::List(args) => commands::list(args, &config),
        Commands::Config(args) => commands::config(args, &config, &manager, &ctx),
    }
}
