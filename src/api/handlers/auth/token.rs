//! Stateless session tokens.
//!
//! Tokens are HS256-signed bundles of `{user id, email, role}` plus expiry.
//! Nothing is retained between issuances, so logout cannot revoke an
//! outstanding token short of rotating the signing secret. The embedded role
//! is a cache: trust decisions that must see a fresh role re-read it from the
//! database (see `principal`).

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::types::Role;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// Signed claims carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    secret: SecretString,
    ttl_seconds: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    /// Issue a token for the given identity with a fresh expiry.
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` if signing fails.
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|_| TokenError::Invalid)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// `TokenError::Expired` past expiry, `TokenError::Invalid` for a bad
    /// signature or malformed token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }

    /// Re-issue a token with the same claims and a fresh expiry.
    ///
    /// # Errors
    /// Fails the same way `verify` does for a bad input token.
    pub fn refresh(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.verify(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)?;
        self.issue(user_id, &claims.email, claims.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl_seconds: i64) -> TokenService {
        TokenService::new(SecretString::from("test-secret"), ttl_seconds)
    }

    #[test]
    fn issue_verify_round_trip() {
        let tokens = service(3600);
        let user_id = Uuid::new_v4();
        let token = tokens
            .issue(user_id, "alice@example.com", Role::User)
            .expect("issue");

        let claims = tokens.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn verify_rejects_garbage() {
        let tokens = service(3600);
        assert_eq!(tokens.verify("not-a-token"), Err(TokenError::Invalid));
        assert_eq!(tokens.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let tokens = service(3600);
        let other = TokenService::new(SecretString::from("other-secret"), 3600);
        let token = other
            .issue(Uuid::new_v4(), "alice@example.com", Role::User)
            .expect("issue");
        assert_eq!(tokens.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn verify_rejects_expired() {
        let tokens = service(-30);
        let token = tokens
            .issue(Uuid::new_v4(), "alice@example.com", Role::Admin)
            .expect("issue");
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn refresh_extends_expiry_and_keeps_claims() {
        let tokens = service(3600);
        let user_id = Uuid::new_v4();
        let token = tokens
            .issue(user_id, "admin@example.com", Role::Admin)
            .expect("issue");

        let refreshed = tokens.refresh(&token).expect("refresh");
        let claims = tokens.verify(&refreshed).expect("verify");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn refresh_fails_like_verify() {
        let tokens = service(3600);
        assert_eq!(tokens.refresh("broken"), Err(TokenError::Invalid));

        let expired = service(-30);
        let token = expired
            .issue(Uuid::new_v4(), "alice@example.com", Role::User)
            .expect("issue");
        assert_eq!(expired.refresh(&token), Err(TokenError::Expired));
    }
}
