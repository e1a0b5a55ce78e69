#![cfg(not(tarpaulin_include))]

use asoa::app;
use asoa::config::{Config, ServerArgs};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Seabreeze owners' directory web server
#[derive(Parser)]
#[command(name = "website", version)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,
}

/// Main entry point for the directory web application
///
/// Reads settings from the command line and environment, sets up logging
/// (`RUST_LOG` overrides the default filter) and serves until killed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("asoa=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    app::run(Config::from(cli.server)).await
}
