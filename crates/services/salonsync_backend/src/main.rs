// --- File: crates/services/salonsync_backend/src/main.rs ---
mod app_state;

use app_state::AppState;
use salonsync_common::logging;
use salonsync_config::{ensure_dotenv_loaded, load_config};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG may come from .env
    let dotenv = ensure_dotenv_loaded();
    logging::init();
    if let Err(e) = dotenv {
        logging::log_error(e, "Starting without environment file");
    }
    let config = logging::log_result(
        load_config(),
        "Configuration loaded",
        "Failed to load configuration",
    )?;

    let state = logging::log_result(
        AppState::new(&config).await,
        "Services initialized",
        "Failed to initialize services",
    )?;
    let app = state.router().layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("SalonSync listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    state.shutdown().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
