// Redis-based Rate Limiting untuk Booking Service
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::{AsyncCommands, Client};
use std::env;
use thiserror::Error;

use crate::{config::AppState, error::AppError};

// Configuration dari environment variables
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub guest_requests_per_hour: u32,
    pub authenticated_requests_per_hour: u32,
    pub sensitive_requests_per_hour: u32,
    pub window_seconds: u64,
}

impl RateLimitConfig {
    // Load config dari environment dengan validation
    pub fn from_env() -> Result<Self, RateLimitError> {
        let guest_requests = read_limit("RATE_LIMIT_GUEST_REQUESTS", 100)?;
        let authenticated_requests = read_limit("RATE_LIMIT_AUTHENTICATED_REQUESTS", 300)?;
        let sensitive_requests = read_limit("RATE_LIMIT_SENSITIVE_ENDPOINTS", 30)?;

        if sensitive_requests > 100 {
            tracing::warn!("Sensitive endpoint rate limit sangat tinggi: {}", sensitive_requests);
        }

        Ok(Self {
            guest_requests_per_hour: guest_requests,
            authenticated_requests_per_hour: authenticated_requests,
            sensitive_requests_per_hour: sensitive_requests,
            window_seconds: 3600,
        })
    }
}

fn read_limit(key: &str, default: u32) -> Result<u32, RateLimitError> {
    let value: u32 = match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| RateLimitError::Configuration)?,
        Err(_) => default,
    };

    if value == 0 {
        return Err(RateLimitError::Configuration);
    }
    Ok(value)
}

// Kategori request untuk menentukan limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Guest,
    Authenticated,
    Sensitive,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Guest => "guest",
            RequestClass::Authenticated => "authenticated",
            RequestClass::Sensitive => "sensitive",
        }
    }
}

// Rate limiter dengan Redis backend
#[derive(Clone)]
pub struct RateLimiter {
    redis_client: Client,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(redis_url: &str) -> Result<Self, RateLimitError> {
        let redis_client = Client::open(redis_url.to_string())
            .map_err(RateLimitError::RedisConnection)?;

        let config = RateLimitConfig::from_env()?;

        Ok(Self {
            redis_client,
            config,
        })
    }

    pub fn max_requests(&self, class: RequestClass) -> u32 {
        match class {
            RequestClass::Guest => self.config.guest_requests_per_hour,
            RequestClass::Authenticated => self.config.authenticated_requests_per_hour,
            RequestClass::Sensitive => self.config.sensitive_requests_per_hour,
        }
    }

    // Sliding window pakai sorted set per identifier + kategori
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        class: RequestClass,
    ) -> Result<RateLimitResult, RateLimitError> {
        let mut conn = self.redis_client.get_multiplexed_async_connection()
            .await
            .map_err(RateLimitError::RedisConnection)?;

        let window_key = format!("rate_limit:booking:{}:{}", identifier, class.as_str());
        let now = chrono::Utc::now();
        let current_time = now.timestamp() as u64;
        let window_start = current_time.saturating_sub(self.config.window_seconds) + 1;
        // Member unik per request supaya request di detik yang sama tetap terhitung
        let member = now.timestamp_nanos_opt().unwrap_or_default();

        let _: () = conn
            .zrembyscore(&window_key, "-inf", window_start - 1)
            .await
            .map_err(RateLimitError::RedisOperation)?;

        let current_count: usize = conn
            .zcard(&window_key)
            .await
            .map_err(RateLimitError::RedisOperation)?;

        let max_requests = self.max_requests(class);

        let _: () = conn
            .zadd(&window_key, member, current_time)
            .await
            .map_err(RateLimitError::RedisOperation)?;

        let _: () = conn
            .expire(&window_key, self.config.window_seconds as i64)
            .await
            .map_err(RateLimitError::RedisOperation)?;

        let allowed = current_count < max_requests as usize;
        let remaining = if allowed {
            max_requests.saturating_sub(current_count as u32 + 1)
        } else {
            0
        };

        Ok(RateLimitResult {
            allowed,
            current_count: current_count as u32 + 1,
            max_requests,
            remaining,
            reset_time: window_start + self.config.window_seconds,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub current_count: u32,
    pub max_requests: u32,
    pub remaining: u32,
    pub reset_time: u64,
}

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Redis connection error: {0}")]
    RedisConnection(#[from] redis::RedisError),
    #[error("Redis operation error: {0}")]
    RedisOperation(redis::RedisError),
    #[error("Rate limit configuration error")]
    Configuration,
}

// Endpoint write yang paling rawan di-spam
pub fn classify(method: &Method, path: &str, headers: &HeaderMap) -> RequestClass {
    let sensitive = *method == Method::POST
        && (path.starts_with("/sessions/book/") || path == "/schedule-templates/generate");

    if sensitive {
        RequestClass::Sensitive
    } else if headers.contains_key(axum::http::header::AUTHORIZATION) {
        RequestClass::Authenticated
    } else {
        RequestClass::Guest
    }
}

// Client identifier dari proxy headers, fallback "unknown"
pub fn extract_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .or_else(|| headers.get("cf-connecting-ip"))
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn is_exempt(path: &str) -> bool {
    path == "/health" || path.starts_with("/docs") || path.starts_with("/api-docs")
}

// Rate limiting middleware untuk Axum
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(rate_limiter) = state.rate_limiter.clone() else {
        return next.run(request).await;
    };

    let path = request.uri().path().to_string();
    if is_exempt(&path) {
        return next.run(request).await;
    }

    let identifier = extract_identifier(request.headers());
    let class = classify(request.method(), &path, request.headers());

    match rate_limiter.check_rate_limit(&identifier, class).await {
        Ok(result) if result.allowed => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();

            headers.insert("X-RateLimit-Limit", HeaderValue::from(result.max_requests));
            headers.insert("X-RateLimit-Used", HeaderValue::from(result.current_count));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(result.remaining));
            headers.insert("X-RateLimit-Reset", HeaderValue::from(result.reset_time));

            response
        }
        Ok(_) => {
            tracing::warn!(
                identifier = %identifier,
                endpoint = %path,
                class = class.as_str(),
                "Rate limit exceeded"
            );
            AppError::RateLimit("Too many requests. Please try again later.".to_string()).into_response()
        }
        Err(e) => {
            // Fail-open kalau Redis bermasalah
            tracing::error!("Rate limiting error: {}", e);
            next.run(request).await
        }
    }
}
