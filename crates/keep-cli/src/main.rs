//! keep - edit and sync Google Keep notes from the terminal

mod cli;
mod commands;
mod config;
mod editor;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::note::run_note;
use crate::commands::sync::run_sync;
use crate::config::{resolve_config_dir, FileConfig, Settings};
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_dir = resolve_config_dir(cli.global.config_dir.clone())?;
    let (file_config, source) = FileConfig::load(&config_dir);
    let settings = Settings::resolve(&cli.global, config_dir, file_config);

    init_logging(settings.verbose)?;
    source.log();

    match cli.command {
        Commands::Note { expression } => run_note(&expression, &settings).await?,
        Commands::Sync => run_sync(&settings).await?,
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(verbose)?)
        .init();
    Ok(())
}

/// `RUST_LOG` when set, otherwise `keep` at info (debug with `--verbose`).
fn log_filter(verbose: bool) -> Result<EnvFilter, CliError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        let directive = if verbose { "keep=debug" } else { "keep=info" };
        EnvFilter::try_new(directive)
            .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))
    })
}
