//! Roster CLI - command-line access to the roster record store.
//!
//! Loads configuration from the environment (and `.env`), opens the JSON
//! snapshot, runs one command and prints its result as JSON.

mod commands;
mod config;
mod error;

use crate::commands::Cli;
use crate::config::Config;
use crate::error::CliError;
use clap::Parser;
use roster_engine::{JsonFileBackend, Store};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster=info,roster_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run() -> Result<(), CliError> {
    // Load configuration
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = cli.snapshot {
        config.snapshot_path = path;
    }

    tracing::debug!(snapshot = %config.snapshot_path.display(), "opening store");
    let mut store = Store::open(JsonFileBackend::new(&config.snapshot_path));

    let stdout = std::io::stdout();
    commands::run(cli.command, &mut store, &config, &mut stdout.lock())
}
