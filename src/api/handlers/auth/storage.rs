//! Database helpers for account records.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{Role, UserResponse};
use super::utils::is_unique_violation;

/// Persisted account fields, minus the password hash.
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) role: Role,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Account fields needed to check a password.
pub(super) struct LoginRecord {
    pub(super) user: UserRecord,
    pub(super) password_hash: String,
}

/// Outcome when inserting a verified account.
#[derive(Debug)]
pub(super) enum InsertOutcome {
    Created(UserRecord),
    DuplicateEmail,
}

fn user_from_row(row: &PgRow) -> Result<UserRecord> {
    let role: String = row.get("role");
    let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown role in users row: {role}"))?;
    Ok(UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        role,
        created_at: row.get("created_at"),
    })
}

/// Check whether an active account already owns the email.
pub(super) async fn email_taken(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT 1 AS present FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check email")?;
    Ok(row.is_some())
}

/// Insert the verified account. The unique index on email is the authority on
/// duplicates; a violation maps to `DuplicateEmail` instead of an error.
pub(super) async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> Result<InsertOutcome> {
    let query = r"
        INSERT INTO users
            (email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, first_name, last_name, role, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(role.as_str())
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(user_from_row(&row)?)),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::DuplicateEmail),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Look up login data by email.
pub(super) async fn fetch_login_record(pool: &PgPool, email: &str) -> Result<Option<LoginRecord>> {
    let query = r"
        SELECT id, email, password_hash, first_name, last_name, role, created_at
        FROM users
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup login record")?;

    row.map(|row| {
        Ok(LoginRecord {
            password_hash: row.get("password_hash"),
            user: user_from_row(&row)?,
        })
    })
    .transpose()
}

/// Re-read an account by id.
pub(crate) async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, email, first_name, last_name, role, created_at
        FROM users
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch user")?;

    row.map(|row| user_from_row(&row)).transpose()
}

/// Current stored role for an account, or `None` if the account is gone.
/// Token claims are only a cache of the role; this is the source of truth.
pub(crate) async fn fetch_user_role(pool: &PgPool, user_id: Uuid) -> Result<Option<Role>> {
    let query = "SELECT role FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch user role")?;

    row.map(|row| {
        let role: String = row.get("role");
        Role::parse(&role).ok_or_else(|| anyhow!("unknown role in users row: {role}"))
    })
    .transpose()
}
