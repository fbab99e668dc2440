//! wise-cli - Send money and inspect a Wise account from the terminal
//!
//! Parses arguments, sets up logging on stderr and hands the command to
//! [`App`]. Errors are printed once and turned into a failing exit code.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wise_cli::app::{App, AppError};
use wise_cli::cli::Cli;

/// Sets up the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output and
/// the default only shows warnings.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let app = App::from_cli(&cli)?;
    let mut stdout = io::stdout().lock();
    app.execute(&cli.command, &mut stdout).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
