use shared::utils::auth::AuthState;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::{middleware::rate_limit::RateLimiter, repositories::store::PgStore};

// Konfigurasi aplikasi dari environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub run_migrations: bool,
    pub redis_url: Option<String>,
    pub scheduler_enabled: bool,
    pub scheduler_interval_secs: u64,
}

impl AppConfig {
    // Load konfigurasi dari environment dengan validasi
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL harus diset")?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET harus diset")?;

        if !cfg!(debug_assertions) && jwt_secret.contains("change-this") {
            return Err("JWT_SECRET masih default! Ganti untuk production".to_string());
        }

        let server_host = env::var("BOOKING_SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("BOOKING_SERVICE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3004);

        let environment = env::var("RUST_ENV")
            .unwrap_or_else(|_| "development".to_string());

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let run_migrations = env_flag("RUN_MIGRATIONS");

        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        let scheduler_enabled = !env_flag("DISABLE_SCHEDULER");

        let scheduler_interval_secs = env::var("SCHEDULER_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(900);

        Ok(AppConfig {
            database_url,
            server_host,
            server_port,
            environment,
            jwt_secret,
            frontend_url,
            run_migrations,
            redis_url,
            scheduler_enabled,
            scheduler_interval_secs,
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
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

// Inisialisasi database pool dengan konfigurasi optimal
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    tracing::info!("Database connected");
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
    pub store: PgStore,
    pub rate_limiter: Option<Arc<RateLimiter>>,
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

        // Rate limiting optional, service tetap jalan tanpa Redis
        let rate_limiter = match &config.redis_url {
            Some(url) => match RateLimiter::new(url) {
                Ok(limiter) => Some(Arc::new(limiter)),
                Err(e) => {
                    tracing::warn!("Rate limiter disabled: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(AppState {
            store: PgStore::new(db.clone()),
            db,
            config,
            rate_limiter,
        })
    }

    // Health check semua dependencies
    pub async fn health_check(&self) -> HealthStatus {
        let db_healthy = check_db_health(&self.db).await;

        HealthStatus {
            service: "booking-service".to_string(),
            database: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
            rate_limiter: if self.rate_limiter.is_some() { "enabled" } else { "disabled" }.to_string(),
            overall: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        }
    }
}

// Response untuk health check endpoint
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct HealthStatus {
    pub service: String,
    pub database: String,
    pub rate_limiter: String,
    pub overall: String,
}
