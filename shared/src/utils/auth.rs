// Authentication extractor untuk axum handlers.
// Identity di-produce sekali dari bearer token lalu di-pass explicit ke handler.
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    models::{claims::Role, error::ErrorBody},
    utils::jwt::validate_token,
};

/// State yang bisa menyediakan JWT secret ke extractor
pub trait AuthState {
    fn jwt_secret(&self) -> &str;
}

// Identity user yang sudah ter-authenticate
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_specialist(&self) -> bool {
        self.role == Role::Specialist
    }

    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }
}

// Identity yang dijamin role client
#[derive(Debug, Clone)]
pub struct AuthClient(pub AuthUser);

// Identity yang dijamin role specialist
#[derive(Debug, Clone)]
pub struct AuthSpecialist(pub AuthUser);

#[derive(Debug, Clone, PartialEq)]
pub enum AuthRejection {
    Unauthorized(String),
    Forbidden(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthorized(msg) => {
                ErrorBody::new("unauthorized", msg).into_response_with(StatusCode::UNAUTHORIZED)
            }
            AuthRejection::Forbidden(msg) => {
                ErrorBody::new("forbidden", msg).into_response_with(StatusCode::FORBIDDEN)
            }
        }
    }
}

/// Validasi raw token (header atau query parameter) jadi AuthUser
pub fn authenticate(token: &str, secret: &str) -> Result<AuthUser, AuthRejection> {
    let claims = validate_token(token, secret)
        .map_err(|_| AuthRejection::Unauthorized("Invalid or expired token".to_string()))?;

    let role = claims
        .role()
        .ok_or_else(|| AuthRejection::Forbidden(format!("Role '{}' cannot access this service", claims.role)))?;

    tracing::debug!(user_id = claims.sub, role = role.as_str(), "User authenticated");

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthRejection::Unauthorized("Authorization header with Bearer token required".to_string()))?;

        authenticate(bearer.token(), state.jwt_secret())
    }
}

impl<S> FromRequestParts<S> for AuthClient
where
    S: AuthState + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_client() {
            return Err(AuthRejection::Forbidden("Client access required".to_string()));
        }

        Ok(AuthClient(user))
    }
}

impl<S> FromRequestParts<S> for AuthSpecialist
where
    S: AuthState + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_specialist() {
            return Err(AuthRejection::Forbidden("Specialist access required".to_string()));
        }

        Ok(AuthSpecialist(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::claims::TokenClaims, utils::jwt::sign_token};
    use axum::http::Request;

    const SECRET: &str = "auth-extractor-test-secret";

    struct TestState;

    impl AuthState for TestState {
        fn jwt_secret(&self) -> &str {
            SECRET
        }
    }

    fn token_for(user_id: i32, role: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user_id,
            email: format!("user{}@example.com", user_id),
            role: role.to_string(),
            exp: now + 600,
            iat: now,
            token_type: "access".to_string(),
            jti: format!("jti-{}", user_id),
        };
        sign_token(&claims, SECRET).unwrap()
    }

    fn parts_with(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/sessions/my");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_extracts_identity_from_bearer() {
        let mut parts = parts_with(Some(format!("Bearer {}", token_for(5, "client"))));
        let user = AuthUser::from_request_parts(&mut parts, &TestState).await.unwrap();
        assert_eq!(user.user_id, 5);
        assert_eq!(user.role, Role::Client);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let mut parts = parts_with(None);
        let result = AuthUser::from_request_parts(&mut parts, &TestState).await;
        assert!(matches!(result, Err(AuthRejection::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_role_guards() {
        let mut parts = parts_with(Some(format!("Bearer {}", token_for(9, "client"))));
        let result = AuthSpecialist::from_request_parts(&mut parts, &TestState).await;
        assert!(matches!(result, Err(AuthRejection::Forbidden(_))));

        let mut parts = parts_with(Some(format!("Bearer {}", token_for(9, "specialist"))));
        let AuthSpecialist(user) = AuthSpecialist::from_request_parts(&mut parts, &TestState)
            .await
            .unwrap();
        assert_eq!(user.user_id, 9);
    }

    #[test]
    fn test_unknown_role_is_forbidden() {
        let result = authenticate(&token_for(1, "admin"), SECRET);
        assert!(matches!(result, Err(AuthRejection::Forbidden(_))));
    }
}
