use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use helmet_pipeline::{AppState, Config, Helmet, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting HP Helmet demo server v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        helmet_config = ?config.helmet_config,
        "Configuration loaded"
    );

    // Resolve helmet options; conflicts and bad values stop startup here
    let options = config.helmet_options().map_err(|e| {
        error!("Failed to load helmet options: {e}");
        exitcode::CONFIG
    })?;
    let helmet = Helmet::new(&options).map_err(|e| {
        error!("Invalid helmet options: {e}");
        exitcode::CONFIG
    })?;
    info!(rules = helmet.rules().len(), "Helmet rule set resolved");

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }
    metrics::set_active_rules(helmet.rules().len());

    // Build application state and router
    let state = AppState::new(helmet);
    let app = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server running at http://{addr}");
    info!("  GET  /health - Health check");
    info!("  ANY  /*      - Greeting through [RequestId, Helmet]");

    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}
