//! Credflow server entry point
//!
//! Initializes configuration and starts the HTTP server exposing the
//! process management API and the execution bridge. Configuration comes
//! from environment variables with sensible local defaults.

use credflow::{config::Config, server::start_server};

/// Application entry point.
///
/// The server provides:
/// - Process management API at /api/processes/*
/// - Execution inspection at /api/executions/{ref}
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
