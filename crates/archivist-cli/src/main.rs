//! Archivist CLI - Command-line client for Archivist runners.

use archivist_cli::commands;
use archivist_cli::{Cli, Command, Formatter};
use archivist_runner::client::RunnerClient;
use archivist_runner::telemetry;
use clap::Parser;
use std::time::Duration;

/// Transport timeout for calls the CLI makes; per-attempt limits come from the commands
const CLIENT_TIMEOUT_SECS: u64 = 900;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> archivist_cli::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing();

    let formatter = Formatter::new(cli.format.into(), !cli.no_color);
    let client = RunnerClient::new(&cli.runner, Duration::from_secs(CLIENT_TIMEOUT_SECS))?;

    match cli.command {
        Command::Prepare(args) => commands::execute_prepare(args, &client, &formatter).await?,
        Command::Analyze(args) => commands::execute_analyze(args, &client, &formatter).await?,
        Command::LoadTest(args) => commands::execute_load_test(args, &client, &formatter).await?,
    }

    Ok(())
}
