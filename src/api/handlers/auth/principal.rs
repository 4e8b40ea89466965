//! Authenticated principal extraction.
//!
//! Flow Overview: read the bearer token, verify its signature and expiry,
//! then re-read the role from the database. The token's embedded role is
//! only a cache of the role at issuance time; re-deriving it here means an
//! administrative promotion or demotion takes effect on the next request.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::state::AuthState;
use super::storage::fetch_user_role;
use super::token::TokenError;
use super::types::Role;
use super::utils::extract_bearer_token;

/// Authenticated user context derived from the bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolve a bearer token into a principal, or return the failing status and
/// message for missing/invalid/expired tokens.
pub async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Principal, (StatusCode, String)> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err((StatusCode::UNAUTHORIZED, "Missing token".to_string()));
    };

    let claims = state.tokens().verify(&token).map_err(|err| match err {
        TokenError::Expired => (StatusCode::UNAUTHORIZED, "Token expired".to_string()),
        TokenError::Invalid => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
    })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid token".to_string()))?;

    // Role freshness: the database wins over the claim.
    let role = match fetch_user_role(pool, user_id).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            // Account no longer exists; the bearer credential is dead.
            return Err((StatusCode::UNAUTHORIZED, "Invalid token".to_string()));
        }
        Err(err) => {
            error!("Failed to resolve principal role: {err}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication failed".to_string(),
            ));
        }
    };

    Ok(Principal {
        user_id,
        email: claims.email,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_is_admin_checks_role() {
        let principal = Principal {
            user_id: Uuid::nil(),
            email: "a@example.com".to_string(),
            role: Role::Admin,
        };
        assert!(principal.is_admin());

        let principal = Principal {
            role: Role::User,
            ..principal
        };
        assert!(!principal.is_admin());
    }
}
