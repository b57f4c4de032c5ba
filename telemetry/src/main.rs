//! Telemetry Service
//!
//! Records page views of the transaction-link pages as per-minute counters
//! and serves the recent counters to the dashboard over a small REST API.
//! The service owns no transaction logic - it is deliberately independent of
//! the link and wallet flows, which keep working when telemetry is down.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use txlink_telemetry::config::Config;
use txlink_telemetry::store::MemoryViewStore;
use txlink_telemetry::ApiServer;

/// Main application entry point that initializes and runs the telemetry
/// service.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Wires up the view store
/// 4. Runs the API server until shutdown
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging for debugging and monitoring
    tracing_subscriber::fmt::init();

    info!("Starting Telemetry Service");

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("Telemetry Service");
        println!();
        println!("Usage: txlink-telemetry [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <path>   Use custom config file path");
        println!("  --help, -h        Show this help message");
        println!();
        println!("Environment variables:");
        println!("  TELEMETRY_CONFIG_PATH    Path to config file (overrides --config)");
        println!("  PORT                     Override api.port");
        println!("  DYNAMODB_TABLE           Override store.table");
        println!("  AWS_REGION               Override store.region");
        return Ok(());
    }

    // Check for custom config path
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" && i + 1 < args.len() {
            std::env::set_var("TELEMETRY_CONFIG_PATH", &args[i + 1]);
            info!("Using custom config: {}", args[i + 1]);
            break;
        }
    }

    // Load configuration from config file (or TELEMETRY_CONFIG_PATH env var)
    let config = Config::load()?;
    info!("Configuration loaded successfully");

    // The in-memory store backs local deployments; persistent stores plug in
    // through the same ViewStore trait.
    let store = Arc::new(MemoryViewStore::new());

    // Run the service (this blocks until shutdown)
    let api_server = ApiServer::new(config, store);
    api_server.run().await?;

    Ok(())
}
