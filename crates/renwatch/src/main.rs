// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renwatch - watches game accounts and posts translated player names.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renwatch_config::{ConfigError, RenwatchConfig};

/// Renwatch - live-match watcher with player name translation.
#[derive(Parser, Debug)]
#[command(name = "renwatch", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the watcher (default).
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<RenwatchConfig, Vec<ConfigError>> {
    let config = match path {
        Some(path) => renwatch_config::load_and_validate_path(path)?,
        None => renwatch_config::load_and_validate()?,
    };
    renwatch_config::validate_credentials(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            renwatch_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                tracing::error!(error = %e, class = %e.class(), "renwatch serve failed");
                eprintln!("renwatch: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            println!(
                "renwatch: configuration OK (backend={:?}, workers={}, poll interval={}s)",
                config.storage.backend, config.delivery.workers, config.poller.interval_secs
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = renwatch_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.poller.interval_secs, 60);
        assert_eq!(config.delivery.queue_capacity, 20);
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["renwatch"]).unwrap();
        assert_eq!(cli.command.unwrap_or(Commands::Serve), Commands::Serve);
        assert!(cli.config.is_none());
    }

    #[test]
    fn check_config_accepts_explicit_path() {
        let cli =
            Cli::try_parse_from(["renwatch", "check-config", "--config", "/tmp/renwatch.toml"])
                .unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/renwatch.toml")));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["renwatch", "shell"]).is_err());
    }
}
