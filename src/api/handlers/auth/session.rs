//! Session endpoints: current account, logout, and token refresh.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::state::AuthState;
use super::storage::fetch_user;
use super::token::TokenError;
use super::types::{RefreshResponse, UserResponse};
use super::utils::extract_bearer_token;
use uuid::Uuid;

/// Unlike the authorization paths, a valid token whose account row is gone
/// answers 404 here: the credential checked out, the profile it points at
/// does not exist anymore.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 404, description = "Account not found", body = String)
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Missing token".to_string()).into_response();
    };
    let claims = match state.tokens().verify(&token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            return (StatusCode::UNAUTHORIZED, "Token expired".to_string()).into_response();
        }
        Err(TokenError::Invalid) => {
            return (StatusCode::UNAUTHORIZED, "Invalid token".to_string()).into_response();
        }
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return (StatusCode::UNAUTHORIZED, "Invalid token".to_string()).into_response();
    };

    match fetch_user(&pool, user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to fetch current account: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Lookup failed".to_string(),
            )
                .into_response()
        }
    }
}

/// Tokens are stateless, so there is nothing to revoke server-side; the
/// endpoint exists so clients have a definite point to discard credentials.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    responses(
        (status = 200, description = "Fresh token", body = RefreshResponse),
        (status = 401, description = "Missing, invalid or expired token", body = String)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Missing token".to_string()).into_response();
    };

    match state.tokens().refresh(&token) {
        Ok(token) => (StatusCode::OK, Json(RefreshResponse { token })).into_response(),
        Err(TokenError::Expired) => {
            (StatusCode::UNAUTHORIZED, "Token expired".to_string()).into_response()
        }
        Err(TokenError::Invalid) => {
            (StatusCode::UNAUTHORIZED, "Invalid token".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::state::test_support::auth_state;
    use super::super::types::Role;
    use super::*;
    use anyhow::Result;
    use axum::http::header::AUTHORIZATION;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() -> Result<()> {
        let (state, _) = auth_state();
        let response = me(HeaderMap::new(), Extension(lazy_pool()?), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn me_with_garbage_token_is_unauthorized() -> Result<()> {
        let (state, _) = auth_state();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer not-a-token".parse()?);
        let response = me(headers, Extension(lazy_pool()?), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn logout_is_no_content() {
        let response = logout().await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn refresh_without_token_is_unauthorized() {
        let (state, _) = auth_state();
        let response = refresh(HeaderMap::new(), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_returns_a_verifiable_token() -> Result<()> {
        let (state, _) = auth_state();
        let token = state
            .tokens()
            .issue(Uuid::new_v4(), "alice@example.com", Role::User)?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);

        let response = refresh(headers, Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_token() -> Result<()> {
        let (state, _) = auth_state();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer broken".parse()?);

        let response = refresh(headers, Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
