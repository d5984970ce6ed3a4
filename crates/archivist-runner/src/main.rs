//! Archivist Runner
//!
//! Starts the runner HTTP server hosting the Archivist entity operations.

use archivist_runner::{config::RunnerConfig, start_server, RunnerError};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), RunnerError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        RunnerConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, running a single standalone shard");
        eprintln!("Usage: archivist-runner --config <path-to-config.toml>");
        eprintln!();
        RunnerConfig::standalone()
    };

    start_server(config).await
}

fn print_help() {
    println!("Archivist Runner - Archive ingestion entity host");
    println!();
    println!("USAGE:");
    println!("    archivist-runner --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    OPENAI_API_KEY       Completion service key (required)");
    println!("    OPENAI_ORGANIZATION  Completion service organization");
    println!("    OPENAI_BASE_URL      Completion service base URL");
    println!("    ZEP_API_KEY          Graph store key (required)");
    println!("    ZEP_GROUP_ID         Graph group (default: 'default')");
    println!("    RUST_LOG             Log filter (default: info)");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address, bind_port: where to listen");
    println!("    - runner_id: the shard served by this process");
    println!("    - shards: array of {{ id, endpoint }} covering the whole cluster");
    println!("    - [ingest], [analyzer], [graph]: pipeline settings");
    println!();
}
