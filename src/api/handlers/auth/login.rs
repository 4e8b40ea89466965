//! Password login.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::state::AuthState;
use super::storage::fetch_login_record;
use super::types::{LoginRequest, TokenResponse};
use super::utils::{normalize_email, verify_password};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 400, description = "Invalid input", body = String),
        (status = 401, description = "Invalid email or password", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Email and password are required".to_string(),
        )
            .into_response();
    }

    // One message for unknown email and wrong password, so callers cannot
    // probe which addresses have accounts.
    let rejected =
        || (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()).into_response();

    let record = match fetch_login_record(&pool, &email).await {
        Ok(Some(record)) => record,
        Ok(None) => return rejected(),
        Err(err) => {
            error!("Failed to lookup login record: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    };

    if !verify_password(&record.password_hash, &request.password) {
        return rejected();
    }

    // The token carries the role as stored right now, not as it was at
    // signup.
    let token = match state
        .tokens()
        .issue(record.user.id, &record.user.email, record.user.role)
    {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue login token: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(TokenResponse {
            token,
            user: record.user.into(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::super::state::test_support::auth_state;
    use super::*;
    use anyhow::Result;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn login_missing_payload() -> Result<()> {
        let (state, _) = auth_state();
        let response = login(Extension(lazy_pool()?), Extension(state), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_empty_fields() -> Result<()> {
        let (state, _) = auth_state();
        let request = LoginRequest {
            email: "alice@example.com".to_string(),
            password: String::new(),
        };
        let response = login(Extension(lazy_pool()?), Extension(state), Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
