//! Vision Plus client binary.
//!
//! Connects to the server, caches pushed configuration and keeps
//! reconnecting until interrupted.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vision_client::{ClientConfig, VisionClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vision_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    tracing::info!("Starting Vision Plus client");

    let config = ClientConfig::from_env()?;
    tracing::info!(
        client_id = %config.client_id,
        server_uri = %config.server_uri,
        reconnect_secs = config.reconnect_delay.as_secs(),
        "Client configuration loaded"
    );

    let client = VisionClient::new(config);

    tokio::select! {
        _ = client.run() => {}
        _ = shutdown_signal() => {
            tracing::info!("Shutting down client");
        }
    }

    tracing::info!("Client stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
