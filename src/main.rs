//! # Lyo API
//!
//! Application entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Error registry and dispatch
//! - HTTP server

use anyhow::Result;
use tracing::info;

use lyo_api::config::Settings;
use lyo_api::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    lyo_api::telemetry::init_tracing(&settings.telemetry);

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.app.environment,
        debug = settings.app.debug,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
