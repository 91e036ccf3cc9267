// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RepairDesk - repair-request intake, dispatch and work tracking.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod migrate;
mod seed;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use repairdesk_config::model::RepairDeskConfig;

/// RepairDesk - repair-request intake, dispatch and work tracking.
#[derive(Parser, Debug)]
#[command(name = "repairdesk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default hierarchy.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Create development users and sample requests.
    Seed,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Print the effective configuration (secrets redacted).
    Config,
}

fn load_config(path: Option<&PathBuf>) -> RepairDeskConfig {
    let loaded = match path {
        Some(path) => repairdesk_config::load_and_validate_path(path),
        None => repairdesk_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            repairdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Seed) => seed::run_seed(config).await,
        Some(Commands::Migrate) => migrate::run_migrate(config).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("repairdesk: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &RepairDeskConfig) -> Result<(), repairdesk_core::RepairDeskError> {
    let rendered = toml::to_string_pretty(&config.redacted())
        .map_err(|e| repairdesk_core::RepairDeskError::Config(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over the configured level.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("repairdesk={log_level},warn")));

    // Ignore the error: a subscriber may already be set (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["repairdesk", "--config", "/tmp/rd.toml", "seed"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Seed)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/rd.toml")));

        let cli = Cli::try_parse_from(["repairdesk", "migrate"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Migrate)));
        assert!(Cli::try_parse_from(["repairdesk", "shell"]).is_err());
    }

    #[test]
    fn printed_config_is_valid_toml_without_secret() {
        let mut config = RepairDeskConfig::default();
        config.gateway.bearer_token = Some("super-secret".into());
        let rendered = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!rendered.contains("super-secret"));
        let reparsed = repairdesk_config::load_and_validate_str(&rendered).unwrap();
        assert_eq!(reparsed.gateway.port, config.gateway.port);
    }
}
