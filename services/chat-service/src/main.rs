// Main entry point untuk chat-service
// Conversation client-specialist dengan delivery real-time lewat WebSocket
use anyhow::Context;
use dotenvy::dotenv;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod agent;
mod config;
mod domain;
mod error;
mod handlers;
mod hub;
mod messaging;
mod repositories;
mod routes;

use config::{AppConfig, AppState};
use hub::ConversationHub;
use routes::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables dari .env file
    if let Err(e) = dotenv() {
        eprintln!("Tidak bisa load .env: {} (menggunakan system env)", e);
    }

    // Initialize tracing subscriber untuk structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Memulai Chat Service");

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Gagal load konfigurasi")?;

    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Server: {}:{}", config.host(), config.port());
    tracing::info!(
        queue = config.ws_queue_capacity,
        ping_secs = config.ws_ping_interval_secs,
        idle_secs = config.ws_idle_timeout_secs,
        "WebSocket settings"
    );

    let app_state = AppState::new(config)
        .await
        .map_err(anyhow::Error::msg)
        .context("Gagal inisialisasi app state")?;

    let addr: SocketAddr = format!("{}:{}", app_state.config.host(), app_state.config.port())
        .parse()
        .context("Host/port server tidak valid")?;

    let hub = Arc::clone(&app_state.hub);
    let app = create_router(app_state);

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("WebSocket: ws://{}/ws/{{id}}?token=...", addr);
    tracing::info!("Swagger UI: http://{}/docs", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Gagal bind server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown gracefully");
    Ok(())
}

// Signal handler untuk graceful shutdown, koneksi WebSocket ditutup dulu
async fn shutdown_signal(hub: Arc<ConversationHub>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to setup terminate signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down gracefully...");
        },
    }

    // Outbound worker berhenti saat queue-nya ditutup
    hub.close_all();
}
