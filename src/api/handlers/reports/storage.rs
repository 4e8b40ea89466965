//! Database helpers for report records.
//!
//! Owner mutations pair a classifying read with a conditional write: the read
//! decides which failure to report (missing, foreign, non-draft) and the
//! write re-checks ownership and draft state in its WHERE clause, so a
//! concurrent transition can never slip an edit past the gate.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{ReportResponse, ReportStatus, ReportType};

/// Persisted report fields.
#[derive(Debug, Clone)]
pub(crate) struct ReportRecord {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) report_type: ReportType,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) media: Vec<String>,
    pub(crate) status: ReportStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<ReportRecord> for ReportResponse {
    fn from(record: ReportRecord) -> Self {
        Self {
            id: record.id.to_string(),
            user_id: record.user_id.to_string(),
            report_type: record.report_type,
            title: record.title,
            description: record.description,
            latitude: record.latitude,
            longitude: record.longitude,
            media: record.media,
            status: record.status,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// Validated fields for a new report.
pub(super) struct NewReport {
    pub(super) report_type: ReportType,
    pub(super) title: String,
    pub(super) description: String,
    pub(super) location: Option<(f64, f64)>,
    pub(super) media: Vec<String>,
}

/// Validated fields for an owner update; `None` leaves the column unchanged.
pub(super) struct ReportChanges {
    pub(super) title: Option<String>,
    pub(super) description: Option<String>,
    pub(super) location: Option<(f64, f64)>,
    pub(super) media: Option<Vec<String>>,
}

/// Outcome of an owner mutation (update or delete).
#[derive(Debug)]
pub(super) enum MutateOutcome<T> {
    Done(T),
    NotFound,
    NotOwner,
    NotDraft,
}

/// Outcome of an admin status assignment, with the context needed to notify
/// the owner.
pub(super) struct StatusChange {
    pub(super) report: ReportRecord,
    pub(super) old_status: ReportStatus,
    pub(super) owner_email: String,
    pub(super) owner_name: String,
}

const REPORT_COLUMNS: &str =
    "id, user_id, report_type, title, description, latitude, longitude, media, status, created_at, updated_at";

fn report_from_row(row: &PgRow) -> Result<ReportRecord> {
    let report_type: String = row.get("report_type");
    let report_type = ReportType::parse(&report_type)
        .ok_or_else(|| anyhow!("unknown report type in reports row: {report_type}"))?;
    let status: String = row.get("status");
    let status = ReportStatus::parse(&status)
        .ok_or_else(|| anyhow!("unknown status in reports row: {status}"))?;
    Ok(ReportRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        report_type,
        title: row.get("title"),
        description: row.get("description"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        media: row.get("media"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a new report. Always lands in `draft`.
pub(super) async fn insert_report(
    pool: &PgPool,
    user_id: Uuid,
    report: &NewReport,
) -> Result<ReportRecord> {
    let query = format!(
        r"
        INSERT INTO reports
            (user_id, report_type, title, description, latitude, longitude, media)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {REPORT_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let (latitude, longitude) = match report.location {
        Some((latitude, longitude)) => (Some(latitude), Some(longitude)),
        None => (None, None),
    };
    let row = sqlx::query(&query)
        .bind(user_id)
        .bind(report.report_type.as_str())
        .bind(&report.title)
        .bind(&report.description)
        .bind(latitude)
        .bind(longitude)
        .bind(&report.media)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert report")?;
    report_from_row(&row)
}

/// Look up a report by id.
pub(super) async fn fetch_report(pool: &PgPool, report_id: Uuid) -> Result<Option<ReportRecord>> {
    let query = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(report_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch report")?;
    row.map(|row| report_from_row(&row)).transpose()
}

/// List reports, newest first. `owner` narrows the listing to one user;
/// `None` lists everything (admin scope).
pub(super) async fn list_reports(
    pool: &PgPool,
    owner: Option<Uuid>,
) -> Result<Vec<ReportRecord>> {
    let query = format!(
        r"
        SELECT {REPORT_COLUMNS}
        FROM reports
        WHERE $1::uuid IS NULL OR user_id = $1
        ORDER BY created_at DESC
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(owner)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list reports")?;
    rows.iter().map(report_from_row).collect()
}

/// Classify why an owner mutation would fail, before attempting the write.
async fn classify_owner_mutation<T>(
    pool: &PgPool,
    report_id: Uuid,
    owner: Uuid,
) -> Result<Option<MutateOutcome<T>>> {
    let query = "SELECT user_id, status FROM reports WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(report_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to classify report mutation")?;

    let Some(row) = row else {
        return Ok(Some(MutateOutcome::NotFound));
    };
    let user_id: Uuid = row.get("user_id");
    if user_id != owner {
        return Ok(Some(MutateOutcome::NotOwner));
    }
    let status: String = row.get("status");
    if status != ReportStatus::Draft.as_str() {
        return Ok(Some(MutateOutcome::NotDraft));
    }
    Ok(None)
}

/// Apply an owner update. Ownership and draft state are re-checked inside the
/// UPDATE itself.
pub(super) async fn update_report(
    pool: &PgPool,
    report_id: Uuid,
    owner: Uuid,
    changes: &ReportChanges,
) -> Result<MutateOutcome<ReportRecord>> {
    if let Some(outcome) = classify_owner_mutation(pool, report_id, owner).await? {
        return Ok(outcome);
    }

    let query = format!(
        r"
        UPDATE reports
        SET title = COALESCE($3, title),
            description = COALESCE($4, description),
            latitude = CASE WHEN $5 THEN $6 ELSE latitude END,
            longitude = CASE WHEN $5 THEN $7 ELSE longitude END,
            media = COALESCE($8, media),
            updated_at = now()
        WHERE id = $1 AND user_id = $2 AND status = 'draft'
        RETURNING {REPORT_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let (latitude, longitude) = match changes.location {
        Some((latitude, longitude)) => (Some(latitude), Some(longitude)),
        None => (None, None),
    };
    let row = sqlx::query(&query)
        .bind(report_id)
        .bind(owner)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.location.is_some())
        .bind(latitude)
        .bind(longitude)
        .bind(&changes.media)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update report")?;

    match row {
        Some(row) => Ok(MutateOutcome::Done(report_from_row(&row)?)),
        // Lost a race with a concurrent transition after classification.
        None => Ok(MutateOutcome::NotDraft),
    }
}

/// Delete an owner's draft. Same gate as `update_report`.
pub(super) async fn delete_report(
    pool: &PgPool,
    report_id: Uuid,
    owner: Uuid,
) -> Result<MutateOutcome<()>> {
    if let Some(outcome) = classify_owner_mutation(pool, report_id, owner).await? {
        return Ok(outcome);
    }

    let query = "DELETE FROM reports WHERE id = $1 AND user_id = $2 AND status = 'draft'";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(report_id)
        .bind(owner)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete report")?;

    if result.rows_affected() == 0 {
        return Ok(MutateOutcome::NotDraft);
    }
    Ok(MutateOutcome::Done(()))
}

/// Assign a status as an administrator. Returns `None` for an unknown report;
/// otherwise the previous status and the owner's contact details ride along
/// for the notification.
pub(super) async fn set_status(
    pool: &PgPool,
    report_id: Uuid,
    new_status: ReportStatus,
) -> Result<Option<StatusChange>> {
    let query = r"
        SELECT r.status, u.email, u.first_name, u.last_name
        FROM reports r
        JOIN users u ON u.id = r.user_id
        WHERE r.id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(report_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch report for status change")?;

    let Some(row) = row else {
        return Ok(None);
    };
    let old_status: String = row.get("status");
    let old_status = ReportStatus::parse(&old_status)
        .ok_or_else(|| anyhow!("unknown status in reports row: {old_status}"))?;
    let owner_email: String = row.get("email");
    let first_name: String = row.get("first_name");
    let last_name: String = row.get("last_name");

    let query = format!(
        r"
        UPDATE reports
        SET status = $2, updated_at = now()
        WHERE id = $1
        RETURNING {REPORT_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(report_id)
        .bind(new_status.as_str())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to set report status")?;

    let Some(row) = row else {
        // Deleted between the read and the write.
        return Ok(None);
    };

    Ok(Some(StatusChange {
        report: report_from_row(&row)?,
        old_status,
        owner_email,
        owner_name: format!("{first_name} {last_name}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutate_outcome_debug_names() {
        assert!(format!("{:?}", MutateOutcome::<()>::NotOwner).contains("NotOwner"));
        assert!(format!("{:?}", MutateOutcome::<()>::NotDraft).contains("NotDraft"));
    }

    #[test]
    fn report_response_keeps_wire_field_names() {
        let record = ReportRecord {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            report_type: ReportType::RedFlag,
            title: "Bribe at permit office".to_string(),
            description: "Details".to_string(),
            latitude: Some(-1.2921),
            longitude: Some(36.8219),
            media: vec!["blob://1".to_string()],
            status: ReportStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(ReportResponse::from(record)).expect("json");
        assert_eq!(
            value.get("type").and_then(|v| v.as_str()),
            Some("red-flag")
        );
        assert_eq!(value.get("status").and_then(|v| v.as_str()), Some("draft"));
        assert!(value.get("report_type").is_none());
    }
}
