use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::{models::error::ErrorBody, utils::auth::AuthRejection};
use thiserror::Error;

// Type alias untuk Result dengan AppError
pub type AppResult<T = ()> = Result<T, AppError>;

// Postgres SQLSTATE untuk unique violation
const UNIQUE_VIOLATION: &str = "23505";

// Custom error type untuk booking service dengan response standardized
#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    ValidationError(String),
    Conflict(String),
    RateLimit(String),
    InternalServer(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Error di seam storage (trait store untuk engine & coordinator)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// Konversi dari sqlx::Error ke AppError
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Data not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                tracing::warn!("Unique constraint violated: {}", db_err);
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => {
                tracing::error!("Database error: {:?}", err);
                AppError::DatabaseError(err)
            }
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
            // JSON valid tapi field salah tipe / di luar range
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

// Implementasi IntoResponse untuk return error sebagai JSON { code, message }
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal storage error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::ValidationError(msg) => {
                tracing::warn!("Validation error: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            AppError::Conflict(msg) => {
                tracing::warn!("Conflict error: {}", msg);
                (StatusCode::CONFLICT, "conflict", msg.clone())
            }
            AppError::RateLimit(msg) => {
                tracing::warn!("Rate limit exceeded: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit", msg.clone())
            }
            AppError::InternalServer(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        ErrorBody::new(code, message).into_response_with(status)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::DatabaseError(err) => write!(f, "Database error: {}", err),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::RateLimit(msg) => write!(f, "Rate limit exceeded: {}", msg),
            AppError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::conflict("x").into_response().status(), StatusCode::CONFLICT);
        assert_eq!(AppError::not_found("x").into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::validation("x").into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::InternalServer("secret detail".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_auth_rejection_mapping() {
        let err = AppError::from(AuthRejection::Forbidden("nope".to_string()));
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    mod extractor_rejections {
        use crate::{domain::template::GenerateSlotsRequest, error::AppError};
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

        async fn generate(
            WithRejection(Json(payload), _): WithRejection<Json<GenerateSlotsRequest>, AppError>,
        ) -> String {
            payload.start_date.to_string()
        }

        async fn book(WithRejection(Path(slot_id), _): WithRejection<Path<i32>, AppError>) -> String {
            slot_id.to_string()
        }

        async fn slots(
            WithRejection(Query(filter), _): WithRejection<Query<crate::domain::slot::SlotFilter>, AppError>,
        ) -> String {
            format!("{:?}", filter.from)
        }

        fn router() -> Router {
            Router::new()
                .route("/schedule-templates/generate", post(generate))
                .route("/sessions/book/{slot_id}", post(book))
                .route("/availability/{id}", get(slots))
        }

        async fn send(request: Request<Body>) -> (StatusCode, ErrorBody) {
            let response = router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body must be JSON");
            (status, body)
        }

        fn json_post(uri: &str, body: &str) -> Request<Body> {
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        }

        #[tokio::test]
        async fn test_out_of_range_date_is_json_validation_error() {
            let (status, body) = send(json_post(
                "/schedule-templates/generate",
                r#"{"start_date":"2026-13-01","end_date":"2026-12-01"}"#,
            ))
            .await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body.code, "validation_error");
            assert!(body.message.contains("start_date"));
        }

        #[tokio::test]
        async fn test_malformed_json_is_bad_request() {
            let (status, body) = send(json_post("/schedule-templates/generate", "{not json")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.code, "bad_request");
        }

        #[tokio::test]
        async fn test_missing_content_type_is_bad_request() {
            let request = Request::post("/schedule-templates/generate")
                .body(Body::from(r#"{"start_date":"2026-11-01","end_date":"2026-11-02"}"#))
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.code, "bad_request");
        }

        #[tokio::test]
        async fn test_non_numeric_path_is_bad_request() {
            let request = Request::post("/sessions/book/abc").body(Body::empty()).unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.code, "bad_request");
        }

        #[tokio::test]
        async fn test_invalid_query_date_is_bad_request() {
            let request = Request::get("/availability/5?from=kemarin").body(Body::empty()).unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.code, "bad_request");
        }
    }
}
