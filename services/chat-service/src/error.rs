use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::{models::error::ErrorBody, utils::auth::AuthRejection};
use std::fmt;
use thiserror::Error;

pub type AppResult<T = ()> = Result<T, AppError>;

const UNIQUE_VIOLATION: &str = "23505";

// Custom error type untuk chat service dengan response standardized
#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    ValidationError(String),
    Conflict(String),
    InternalServer(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}

/// Error di seam ChatStore
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Data not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                tracing::warn!("Unique constraint violated: {}", db_err);
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(db) => AppError::from(db),
            StoreError::Unavailable(msg) => AppError::InternalServer(msg),
        }
    }
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Unauthorized(msg) => AppError::Unauthorized(msg),
            AuthRejection::Forbidden(msg) => AppError::Forbidden(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

// Rejection extractor axum dibungkus jadi body { code, message }
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::ValidationError(e.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal storage error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::ValidationError(msg) => {
                tracing::warn!("Validation error: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::InternalServer(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error".to_string())
            }
        };

        ErrorBody::new(code, message).into_response_with(status)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(err) => write!(f, "Database error: {}", err),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_is_opaque_500() {
        let response = AppError::from(StoreError::Unavailable("pool timed out".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_rejection_mapping() {
        let err = AppError::from(AuthRejection::Unauthorized("missing".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    mod extractor_rejections {
        use crate::{domain::SendMessageRequest, domain::MessageQuery, error::AppError};
        use axum::{
            body::{to_bytes, Body},
            extract::{Path, Query},
            http::{header, Request, StatusCode},
            routing::{get, post},
            Json, Router,
        };
        use axum_extra::extract::WithRejection;
        use shared::models::error::ErrorBody;
        use tower::ServiceExt;

        async fn send_message(
            WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
            WithRejection(Json(request), _): WithRejection<Json<SendMessageRequest>, AppError>,
        ) -> String {
            format!("{} {}", id, request.content)
        }

        async fn messages(
            WithRejection(Query(page), _): WithRejection<Query<MessageQuery>, AppError>,
        ) -> String {
            page.limit().to_string()
        }

        fn router() -> Router {
            Router::new()
                .route("/conversations/{id}/messages", post(send_message))
                .route("/messages", get(messages))
        }

        async fn send(request: Request<Body>) -> (StatusCode, ErrorBody) {
            let response = router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body must be JSON");
            (status, body)
        }

        #[tokio::test]
        async fn test_wrong_field_type_is_json_validation_error() {
            let request = Request::post("/conversations/1/messages")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"content": 42}"#))
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body.code, "validation_error");
        }

        #[tokio::test]
        async fn test_non_numeric_conversation_id_is_bad_request() {
            let request = Request::post("/conversations/abc/messages")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"content": "halo"}"#))
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.code, "bad_request");
        }

        #[tokio::test]
        async fn test_invalid_pagination_is_bad_request() {
            let request = Request::get("/messages?limit=banyak").body(Body::empty()).unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.code, "bad_request");
        }
    }
}
