//! Relay Monitor entry point
//!
//! Run with:
//! ```bash
//! RELAY_CHANNELS=chat,status cargo run -p relay-monitor
//! ```
//!
//! Configuration is loaded from environment variables.

use relay_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Configuration decides the log format, so load it before tracing
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let tracing_config = if config.app.env.is_production() {
        TracingConfig::production()
    } else {
        TracingConfig::development()
    };
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Relay monitor failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        name = %config.app.name,
        env = ?config.app.env,
        channels = ?config.relay.channels,
        debug = config.relay.debug,
        "Starting Relay Monitor..."
    );

    relay_monitor::run(config, shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
    }
    info!("Shutdown signal received");
}
