//! Signup and one-time-code verification endpoints.
//!
//! Signup never creates a user row: it parks a pending entry (hashed password
//! plus a 6-digit code) in the in-memory registry and delivers the code. The
//! row is inserted by `verify_otp`, the only path that creates accounts.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::state::AuthState;
use super::storage::{InsertOutcome, email_taken, insert_user};
use super::types::{Role, SignupRequest, SignupResponse, TokenResponse, VerifyOtpRequest};
use super::utils::{generate_otp_code, hash_password, normalize_email, valid_email, valid_password};

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 202, description = "Verification code sent", body = SignupResponse),
        (status = 400, description = "Invalid input", body = String),
        (status = 409, description = "Email already registered", body = String),
        (status = 502, description = "Code delivery failed", body = String)
    ),
    tag = "auth"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let request: SignupRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email address".to_string()).into_response();
    }
    if !valid_password(&request.password) {
        return (
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters".to_string(),
        )
            .into_response();
    }
    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "First and last name are required".to_string(),
        )
            .into_response();
    }

    match email_taken(&pool, &email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                "Email already registered".to_string(),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(err) => {
            error!("Failed to check email for signup: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signup failed".to_string(),
            )
                .into_response();
        }
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signup failed".to_string(),
            )
                .into_response();
        }
    };

    let code = generate_otp_code();
    let display_name = format!("{first_name} {last_name}");

    // Deliver before storing: a failed delivery must not leave a pending
    // signup behind that the caller believes was never started.
    if let Err(err) = state.notifier().send_code(&email, &code, &display_name) {
        error!("Failed to deliver signup code: {err}");
        return (
            StatusCode::BAD_GATEWAY,
            "Could not deliver verification code".to_string(),
        )
            .into_response();
    }

    state
        .otp()
        .store(
            &email,
            code,
            password_hash,
            first_name.to_string(),
            last_name.to_string(),
        )
        .await;

    (
        StatusCode::ACCEPTED,
        Json(SignupResponse {
            message: "Verification code sent".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid or expired code", body = String),
        (status = 409, description = "Email already registered", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> impl IntoResponse {
    let request: VerifyOtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    let code = request.code.trim();
    if code.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing code".to_string()).into_response();
    }

    // One generic failure for "never requested", "wrong code", and "timed
    // out" so the response leaks nothing about pending signups.
    let Some(pending) = state.otp().consume(&email, code).await else {
        return (
            StatusCode::BAD_REQUEST,
            "Invalid or expired code".to_string(),
        )
            .into_response();
    };

    let role = if state.config().is_administrative_identity(&email) {
        Role::Admin
    } else {
        Role::User
    };

    let user = match insert_user(
        &pool,
        &email,
        &pending.password_hash,
        &pending.first_name,
        &pending.last_name,
        role,
    )
    .await
    {
        Ok(InsertOutcome::Created(user)) => user,
        Ok(InsertOutcome::DuplicateEmail) => {
            return (
                StatusCode::CONFLICT,
                "Email already registered".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("Failed to insert verified user: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response();
        }
    };

    let token = match state.tokens().issue(user.id, &user.email, user.role) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue token after verification: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response();
        }
    };

    (
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user: user.into(),
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

    fn signup_request() -> SignupRequest {
        SignupRequest {
            email: "alice@example.com".to_string(),
            password: "correct horse".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Wangari".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_missing_payload() -> Result<()> {
        let (state, _) = auth_state();
        let response = signup(Extension(lazy_pool()?), Extension(state), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_invalid_email() -> Result<()> {
        let (state, _) = auth_state();
        let request = SignupRequest {
            email: "not-an-email".to_string(),
            ..signup_request()
        };
        let response = signup(Extension(lazy_pool()?), Extension(state), Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_short_password() -> Result<()> {
        let (state, _) = auth_state();
        let request = SignupRequest {
            password: "short".to_string(),
            ..signup_request()
        };
        let response = signup(Extension(lazy_pool()?), Extension(state), Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_blank_names() -> Result<()> {
        let (state, _) = auth_state();
        let request = SignupRequest {
            first_name: "  ".to_string(),
            ..signup_request()
        };
        let response = signup(Extension(lazy_pool()?), Extension(state), Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_otp_missing_payload() -> Result<()> {
        let (state, _) = auth_state();
        let response = verify_otp(Extension(lazy_pool()?), Extension(state), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_otp_without_pending_entry_is_generic_failure() -> Result<()> {
        let (state, _) = auth_state();
        let request = VerifyOtpRequest {
            email: "alice@example.com".to_string(),
            code: "123456".to_string(),
        };
        let response = verify_otp(Extension(lazy_pool()?), Extension(state), Some(Json(request)))
            .await
            .into_response();
        // Never-requested and wrong-code must be indistinguishable.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_otp_wrong_code_keeps_pending_entry() -> Result<()> {
        let (state, _) = auth_state();
        state
            .otp()
            .store(
                "alice@example.com",
                "123456".to_string(),
                "$argon2id$stub".to_string(),
                "Alice".to_string(),
                "Wangari".to_string(),
            )
            .await;

        let request = VerifyOtpRequest {
            email: "alice@example.com".to_string(),
            code: "654321".to_string(),
        };
        let response = verify_otp(
            Extension(lazy_pool()?),
            Extension(state.clone()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The entry survived the wrong attempt.
        assert!(
            state
                .otp()
                .consume("alice@example.com", "123456")
                .await
                .is_some()
        );
        Ok(())
    }
}
