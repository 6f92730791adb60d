//! Vision Plus Server
//!
//! Accepts WebSocket subscribers, answers configuration requests and
//! acknowledges inference requests.

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vision_server::{build_router, AppState, ResultExt, ServerConfig};

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vision_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Vision Plus server");

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load server config, using defaults");
        ServerConfig::default()
    });

    let model_config = config
        .load_model_config()
        .log("Failed to load model configuration")?;

    tracing::info!(
        host = %config.host,
        port = config.port,
        step_mode = ?config.step_mode,
        "Configuration loaded"
    );

    let bind_address = config.bind_address();
    let state = AppState::new(config, model_config);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .log("Failed to bind to address")?;

    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .log("Failed to serve app")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
