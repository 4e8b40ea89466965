//! Citizen-facing report endpoints: create, read, list, update, delete.
//!
//! Ownership rules: any authenticated user creates reports; reading takes
//! owner or admin; editing and deleting take the owner while the report is
//! still a draft, with no admin exemption.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::api::handlers::auth::{AuthState, require_auth};

use super::storage::{
    MutateOutcome, NewReport, ReportChanges, delete_report, fetch_report, insert_report,
    list_reports, update_report,
};
use super::types::{CreateReportRequest, ReportResponse, ReportType, UpdateReportRequest};

/// Accept a lat/lng pair only when both are present and in range, or both
/// absent.
fn parse_location(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<(f64, f64)>, String> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => {
            if !latitude.is_finite() || !longitude.is_finite() {
                return Err("Location out of range".to_string());
            }
            if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
                return Err("Location out of range".to_string());
            }
            Ok(Some((latitude, longitude)))
        }
        _ => Err("Latitude and longitude must be provided together".to_string()),
    }
}

fn parse_report_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

#[utoipa::path(
    post,
    path = "/v1/reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report created as a draft", body = ReportResponse),
        (status = 400, description = "Invalid input", body = String),
        (status = 401, description = "Missing, invalid or expired token", body = String)
    ),
    tag = "reports"
)]
pub async fn create(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateReportRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(rejection) => return rejection.into_response(),
    };

    let request: CreateReportRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let Some(report_type) = ReportType::parse(request.report_type.trim()) else {
        return (StatusCode::BAD_REQUEST, "Invalid report type".to_string()).into_response();
    };
    let title = request.title.trim();
    if title.is_empty() {
        return (StatusCode::BAD_REQUEST, "Title is required".to_string()).into_response();
    }
    let description = request.description.trim();
    if description.is_empty() {
        return (StatusCode::BAD_REQUEST, "Description is required".to_string()).into_response();
    }
    let location = match parse_location(request.latitude, request.longitude) {
        Ok(location) => location,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    let report = NewReport {
        report_type,
        title: title.to_string(),
        description: description.to_string(),
        location,
        media: request.media.unwrap_or_default(),
    };

    match insert_report(&pool, principal.user_id, &report).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(ReportResponse::from(record))).into_response()
        }
        Err(err) => {
            error!("Failed to insert report: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not create report".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/reports",
    responses(
        (status = 200, description = "Reports visible to the caller", body = [ReportResponse]),
        (status = 401, description = "Missing, invalid or expired token", body = String)
    ),
    tag = "reports"
)]
pub async fn list(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(rejection) => return rejection.into_response(),
    };

    // Admins see everything; everyone else sees their own reports.
    let owner = if principal.is_admin() {
        None
    } else {
        Some(principal.user_id)
    };

    match list_reports(&pool, owner).await {
        Ok(records) => {
            let reports: Vec<ReportResponse> =
                records.into_iter().map(ReportResponse::from).collect();
            (StatusCode::OK, Json(reports)).into_response()
        }
        Err(err) => {
            error!("Failed to list reports: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not list reports".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/reports/{id}",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Not the owner", body = String),
        (status = 404, description = "Unknown report", body = String)
    ),
    tag = "reports"
)]
pub async fn get(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(rejection) => return rejection.into_response(),
    };

    let Some(report_id) = parse_report_id(&id) else {
        return (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response();
    };

    match fetch_report(&pool, report_id).await {
        Ok(Some(record)) => {
            if record.user_id != principal.user_id && !principal.is_admin() {
                return (StatusCode::FORBIDDEN, "Forbidden".to_string()).into_response();
            }
            (StatusCode::OK, Json(ReportResponse::from(record))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to fetch report: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not fetch report".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/reports/{id}",
    params(("id" = String, Path, description = "Report id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Updated report", body = ReportResponse),
        (status = 400, description = "Invalid input", body = String),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Not the owner", body = String),
        (status = 404, description = "Unknown report", body = String),
        (status = 409, description = "Report is no longer editable", body = String)
    ),
    tag = "reports"
)]
pub async fn update(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateReportRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(rejection) => return rejection.into_response(),
    };

    let Some(report_id) = parse_report_id(&id) else {
        return (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response();
    };

    let request: UpdateReportRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let title = match request.title {
        Some(title) => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return (StatusCode::BAD_REQUEST, "Title is required".to_string())
                    .into_response();
            }
            Some(title)
        }
        None => None,
    };
    let description = match request.description {
        Some(description) => {
            let description = description.trim().to_string();
            if description.is_empty() {
                return (
                    StatusCode::BAD_REQUEST,
                    "Description is required".to_string(),
                )
                    .into_response();
            }
            Some(description)
        }
        None => None,
    };
    let location = match parse_location(request.latitude, request.longitude) {
        Ok(location) => location,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    let changes = ReportChanges {
        title,
        description,
        location,
        media: request.media,
    };

    match update_report(&pool, report_id, principal.user_id, &changes).await {
        Ok(MutateOutcome::Done(record)) => {
            (StatusCode::OK, Json(ReportResponse::from(record))).into_response()
        }
        Ok(MutateOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response()
        }
        Ok(MutateOutcome::NotOwner) => {
            (StatusCode::FORBIDDEN, "Forbidden".to_string()).into_response()
        }
        Ok(MutateOutcome::NotDraft) => (
            StatusCode::CONFLICT,
            "Report is no longer editable".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update report: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not update report".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/reports/{id}",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Not the owner", body = String),
        (status = 404, description = "Unknown report", body = String),
        (status = 409, description = "Report is no longer editable", body = String)
    ),
    tag = "reports"
)]
pub async fn delete(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(rejection) => return rejection.into_response(),
    };

    let Some(report_id) = parse_report_id(&id) else {
        return (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response();
    };

    match delete_report(&pool, report_id, principal.user_id).await {
        Ok(MutateOutcome::Done(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(MutateOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response()
        }
        Ok(MutateOutcome::NotOwner) => {
            (StatusCode::FORBIDDEN, "Forbidden".to_string()).into_response()
        }
        Ok(MutateOutcome::NotDraft) => (
            StatusCode::CONFLICT,
            "Report is no longer editable".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to delete report: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not delete report".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_location_accepts_pair_or_absence() {
        assert_eq!(parse_location(None, None), Ok(None));
        assert_eq!(
            parse_location(Some(-1.2921), Some(36.8219)),
            Ok(Some((-1.2921, 36.8219)))
        );
    }

    #[test]
    fn parse_location_rejects_half_pairs() {
        assert!(parse_location(Some(-1.2921), None).is_err());
        assert!(parse_location(None, Some(36.8219)).is_err());
    }

    #[test]
    fn parse_location_rejects_out_of_range() {
        assert!(parse_location(Some(91.0), Some(0.0)).is_err());
        assert!(parse_location(Some(0.0), Some(-180.5)).is_err());
        assert!(parse_location(Some(f64::NAN), Some(0.0)).is_err());
    }

    #[test]
    fn parse_report_id_requires_uuid() {
        assert!(parse_report_id("not-a-uuid").is_none());
        assert!(parse_report_id(" 00000000-0000-0000-0000-000000000000 ").is_some());
    }
}
