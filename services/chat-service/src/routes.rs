// API Routes untuk Chat Service dengan OpenAPI documentation
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::get,
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppState, HealthCheckResponse},
    handlers::{conversations, messages, websocket},
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

// OpenAPI Documentation untuk Chat Service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chat Service API",
        version = "1.0.0",
        description = "Chat client dengan specialist.\n\n## Features\n\n- Conversation per pasangan client dan specialist\n- Real-time messaging lewat WebSocket `/ws/{id}?token=...`\n- Read state dan unread summary\n\n## WebSocket frames\n\nClient mengirim `{\"content\": \"...\"}`. Server mengirim setiap message baru (termasuk milik pengirim) sebagai `{\"id\", \"conversationId\", \"senderId\", \"senderName\", \"content\", \"createdAt\"}`. Frame yang tidak valid diabaikan.",
    ),
    paths(
        conversations::create_conversation,
        conversations::list_conversations,
        conversations::get_conversation,
        conversations::unread_summary,
        conversations::health_check,
        messages::get_messages,
        messages::send_message,
        websocket::websocket_handler,
    ),
    components(
        schemas(
            crate::domain::Conversation,
            crate::domain::ConversationSummary,
            crate::domain::CreateConversationRequest,
            crate::domain::UnreadCount,
            crate::domain::UnreadSummary,
            crate::domain::ThreadMessage,
            crate::domain::MessageFrame,
            crate::domain::SendMessageRequest,
            HealthCheckResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "conversations", description = "Conversation management"),
        (name = "messages", description = "Message thread dan pengiriman"),
        (name = "websocket", description = "Koneksi real-time per conversation"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

// Buat router lengkap dengan docs, CORS, tracing dan security headers
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.frontend_url);
    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/health", get(conversations::health_check))
        .merge(build_api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi.clone()))
        .merge(Redoc::with_url("/redoc", openapi))
        .fallback(not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
        )
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state)
}

fn build_api_routes() -> Router<AppState> {
    Router::new()
        // Conversations
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route("/conversations/unread", get(conversations::unread_summary))
        .route("/conversations/{id}", get(conversations::get_conversation))

        // Messages
        .route(
            "/conversations/{id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )

        // WebSocket
        .route("/ws/{id}", get(websocket::websocket_handler))
}

fn build_cors(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
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

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("strict-origin-when-cross-origin"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.remove(header::SERVER);

    response
}
