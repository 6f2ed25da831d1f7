//! CLI entry point for the IIIF download timer.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap::error::ErrorKind;
use iiif_timer::DownloadCoordinator;
use tracing::{debug, info};

mod cli;
mod output;

use cli::Args;

/// Exit code for missing or malformed arguments.
const USAGE_EXIT_CODE: u8 = 1;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            // Best effort: a closed stderr must not change the exit code
            let _ = err.print();
            return Ok(ExitCode::from(USAGE_EXIT_CODE));
        }
    };

    init_tracing(args.default_log_level());

    debug!(?args, "CLI arguments parsed");
    info!("IIIF timer starting");

    let coordinator = DownloadCoordinator::new(args.to_config())?;

    let run = tokio::select! {
        result = coordinator.run() => result.context("timing run aborted")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for interrupt")?;
            bail!("interrupted while waiting for downloads");
        }
    };

    output::print_report(&run, args.json)?;

    Ok(ExitCode::SUCCESS)
}

/// Installs the stderr log subscriber.
///
/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > default (info).
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
