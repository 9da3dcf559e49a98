//! Lapse - in-memory session store with TTL eviction
//!
//! Main entry point for the Lapse CLI.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;

use lapse_config::{LoggingConfig, SessionOverrides};

mod commands;

use commands::{config, demo, soak, watch};

/// Filter used for `--verbose`.
const VERBOSE_FILTER: &str = "lapse=debug,lapse_session=debug,lapse_config=debug,info";

/// Filter for the rotating JSON log file.
const FILE_FILTER: &str = "lapse=trace,lapse_session=trace,lapse_config=trace,info";

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Lapse - in-memory session store with TTL eviction
#[derive(Parser)]
#[command(name = "lapse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding the user config.toml
    #[arg(long, global = true, env = "LAPSE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Override session.max_age_secs
    #[arg(long, global = true)]
    pub max_age_secs: Option<u64>,

    /// Override session.sweep_interval_secs
    #[arg(long, global = true)]
    pub sweep_interval_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, update and read back one session
    Demo(demo::DemoArgs),

    /// Hammer one store from many threads and report the outcome
    Soak(soak::SoakArgs),

    /// Create sessions and print each eviction as it happens
    Watch(watch::WatchArgs),

    /// Show the effective configuration and where it came from
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let mut loaded = lapse_config::discover(cli.config_dir.as_deref(), &project_dir);

    // CLI arguments are the top layer.
    loaded.apply_overrides(&SessionOverrides {
        max_age_secs: cli.max_age_secs,
        sweep_interval_secs: cli.sweep_interval_secs,
    });
    loaded
        .validate()
        .context("invalid session configuration")?;

    let _guard = init_tracing(&loaded.config.logging(), cli.verbose);
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        loaded,
    };

    match cli.command {
        Commands::Demo(args) => demo::run(args, &ctx).await,
        Commands::Soak(args) => soak::run(args, &ctx).await,
        Commands::Watch(args) => watch::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Initialize tracing: console on stderr plus an optional rotating JSON file.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        VERBOSE_FILTER.to_string()
    } else {
        logging.level.clone()
    };

    let (plain, json) = if logging.json {
        let layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::new(&filter));
        (None, Some(layer))
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::new(&filter));
        (Some(layer), None)
    };

    let (file, guard) = match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lapse.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(file)
        .init();

    guard
}
