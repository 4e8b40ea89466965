//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Tokens embed the role at issuance time; sensitive checks
/// re-read it from the database.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sanitized account profile. Never carries the password hash.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn role_serializes_lowercase() -> Result<()> {
        assert_eq!(serde_json::to_string(&Role::Admin)?, "\"admin\"");
        let role: Role = serde_json::from_str("\"user\"")?;
        assert_eq!(role, Role::User);
        Ok(())
    }

    #[test]
    fn signup_request_round_trips() -> Result<()> {
        let request = SignupRequest {
            email: "alice@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Wangari".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: SignupRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.email, "alice@example.com");
        assert_eq!(decoded.first_name, "Alice");
        Ok(())
    }
}
