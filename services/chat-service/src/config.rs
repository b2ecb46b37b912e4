// Konfigurasi Chat Service
use serde::Serialize;
use shared::utils::auth::AuthState;
use sqlx::{postgres::PgConnectOptions, postgres::PgPoolOptions, PgPool};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    agent::AgentSettings,
    hub::{ConversationHub, DEFAULT_QUEUE_CAPACITY},
    messaging::SharedChatStore,
    repositories::PgChatStore,
};

// Health check response structure
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthCheckResponse {
    pub service: String,
    pub status: String,
    pub version: String,
    pub database: String,
    pub live_connections: usize,
}

// Application configuration yang di-load dari environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub run_migrations: bool,
    pub ws_queue_capacity: usize,
    pub ws_ping_interval_secs: u64,
    pub ws_idle_timeout_secs: u64,
}

impl AppConfig {
    // Load semua konfigurasi dari environment variables dengan validasi
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL harus diset di environment")?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET harus diset di environment")?;

        // Validasi JWT secret tidak menggunakan default value di production
        if !cfg!(debug_assertions) && jwt_secret.contains("change-this") {
            return Err("JWT_SECRET masih menggunakan default value! Ganti dengan value yang aman untuk production".to_string());
        }

        let server_host = env::var("CHAT_SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env_number("CHAT_SERVICE_PORT").unwrap_or(3006);

        let environment = env::var("RUST_ENV")
            .unwrap_or_else(|_| "development".to_string());

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let run_migrations = env::var("RUN_MIGRATIONS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let ws_queue_capacity = env_number("WS_QUEUE_CAPACITY").unwrap_or(DEFAULT_QUEUE_CAPACITY);
        let ws_ping_interval_secs = env_number("WS_PING_INTERVAL_SECS").unwrap_or(30);
        let ws_idle_timeout_secs = env_number("WS_IDLE_TIMEOUT_SECS").unwrap_or(90);

        if ws_idle_timeout_secs <= ws_ping_interval_secs {
            return Err("WS_IDLE_TIMEOUT_SECS harus lebih besar dari WS_PING_INTERVAL_SECS".to_string());
        }

        Ok(AppConfig {
            database_url,
            server_host,
            server_port,
            environment,
            jwt_secret,
            frontend_url,
            run_migrations,
            ws_queue_capacity,
            ws_ping_interval_secs,
            ws_idle_timeout_secs,
        })
    }

    // Helper cek production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn host(&self) -> &str {
        &self.server_host
    }

    pub fn port(&self) -> u16 {
        self.server_port
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            ping_interval: Duration::from_secs(self.ws_ping_interval_secs),
            idle_timeout: Duration::from_secs(self.ws_idle_timeout_secs),
        }
    }
}

// Angka positif dari env, selain itu None
fn env_number<T: FromStr + PartialOrd + Default>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > T::default())
}

// Inisialisasi database connection pool dengan optimal configuration
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing Chat Service database connection...");

    // Disable prepared statement cache untuk pooler (pgbouncer/Supabase)
    let options = PgConnectOptions::from_str(database_url)?
        .statement_cache_capacity(0);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect_with(options)
        .await?;

    tracing::info!("Chat Service database pool initialized");
    Ok(pool)
}

// Health check database connection
pub async fn check_db_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1")
        .fetch_optional(pool)
        .await
        .is_ok()
}

// Application state yang di-share ke semua handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: AppConfig,
    pub hub: Arc<ConversationHub>,
    pub store: SharedChatStore,
}

impl axum::extract::FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl AuthState for AppState {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}

impl AppState {
    // Inisialisasi application state
    pub async fn new(config: AppConfig) -> Result<Self, String> {
        let db = init_db_pool(&config.database_url)
            .await
            .map_err(|e| format!("Failed to init database: {}", e))?;

        if config.run_migrations {
            tracing::info!("Running database migrations...");
            sqlx::migrate!("../../migrations")
                .run(&db)
                .await
                .map_err(|e| format!("Failed to run migrations: {}", e))?;
        }

        let hub = Arc::new(ConversationHub::new(config.ws_queue_capacity));
        let store: SharedChatStore = Arc::new(PgChatStore::new(db.clone()));

        Ok(AppState { db, config, hub, store })
    }

    // Health check semua dependencies
    pub async fn health_check(&self) -> HealthCheckResponse {
        let db_healthy = check_db_health(&self.db).await;

        HealthCheckResponse {
            service: "chat-service".to_string(),
            status: if db_healthy { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if db_healthy { "connected" } else { "disconnected" }.to_string(),
            live_connections: self.hub.total_connections(),
        }
    }
}
