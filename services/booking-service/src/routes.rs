// API Routes untuk booking-service dengan OpenAPI documentation
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppState, HealthStatus},
    handlers::{availability, sessions, templates},
    middleware::rate_limit::rate_limit_middleware,
};

// Security scheme modifier untuk Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build()
                ),
            )
        }
    }
}

// OpenAPI Documentation untuk booking-service
#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        availability::create_slot,
        availability::list_slots,
        availability::delete_slot,
        templates::create_template,
        templates::list_templates,
        templates::update_template,
        templates::delete_template,
        templates::generate_slots,
        sessions::book_slot,
        sessions::my_sessions,
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::domain::slot::AvailabilitySlot,
            crate::domain::slot::CreateSlotRequest,
            crate::domain::template::ScheduleTemplate,
            crate::domain::template::CreateTemplateRequest,
            crate::domain::template::UpdateTemplateRequest,
            crate::domain::template::GenerateSlotsRequest,
            crate::domain::template::GenerationReport,
            crate::domain::session::Session,
            crate::handlers::MessageResponse,
            HealthStatus,
        )
    ),
    tags(
        (name = "availability", description = "Slot availability specialist"),
        (name = "schedule-templates", description = "Recurring weekly schedule dan slot generation"),
        (name = "sessions", description = "Booking slot jadi session"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Booking Service API",
        description = "API untuk availability specialist, schedule template, dan booking session.\n\n## Authentication\n\nEndpoint yang butuh login memakai JWT Bearer token dari auth service.\nInclude token di header `Authorization: Bearer {token}`.",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service health", body = HealthStatus))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.health_check().await)
}

// Buat router lengkap dengan docs, CORS, tracing, security headers dan rate limit
pub fn create_router(state: AppState) -> Router {
    if state.config.is_production() {
        tracing::warn!("Running in PRODUCTION mode - strict validation enabled");
    } else {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let cors = build_cors(&state.config.frontend_url);
    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/health", get(health_check))
        .merge(build_api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi))
        .fallback(not_found_handler)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
        )
        .with_state(state)
}

// Identity di-extract per handler lewat AuthUser / AuthClient / AuthSpecialist
fn build_api_routes() -> Router<AppState> {
    Router::new()
        // Availability slots
        .route("/availability", post(availability::create_slot))
        .route(
            "/availability/{id}",
            get(availability::list_slots).delete(availability::delete_slot),
        )

        // Schedule templates
        .route(
            "/schedule-templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/schedule-templates/generate", post(templates::generate_slots))
        .route(
            "/schedule-templates/{id}",
            put(templates::update_template).delete(templates::delete_template),
        )

        // Sessions
        .route("/sessions/book/{slot_id}", post(sessions::book_slot))
        .route("/sessions/my", get(sessions::my_sessions))
}

fn build_cors(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
        ])
        .max_age(Duration::from_secs(86400));

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("FRONTEND_URL tidak valid, CORS origin tidak diset: {}", frontend_url);
            cors
        }
    }
}

// Handler untuk 404 errors
async fn not_found_handler() -> Response {
    use axum::response::IntoResponse;
    crate::error::AppError::not_found("API endpoint tidak ditemukan").into_response()
}

// Security Headers Middleware untuk HTTP security
async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; frame-ancestors 'none'"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("strict-origin-when-cross-origin"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache, must-revalidate, private"));
    headers.remove(header::SERVER);

    response
}
