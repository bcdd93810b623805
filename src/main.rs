//! pdcache - persistent-disk cache for container images
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use pdcache::cli::{Cli, Commands};
use pdcache::config::ConfigManager;
use pdcache::error::PdCacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> PdCacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2 = debug, 3+ = trace (includes command output)
    let filter = match cli.verbose {
        0 => EnvFilter::new("pdcache=warn"),
        1 => EnvFilter::new("pdcache=info"),
        2 => EnvFilter::new("pdcache=debug"),
        _ => EnvFilter::new("pdcache=trace"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Get(args) => pdcache::cli::commands::get(args, &config).await,
        Commands::Release(args) => pdcache::cli::commands::release(args, &config).await,
        Commands::Status(args) => pdcache::cli::commands::status(args, &config).await,
        Commands::Names(args) => pdcache::cli::commands::names(args, &config).await,
        Commands::Config(args) => {
            pdcache::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
