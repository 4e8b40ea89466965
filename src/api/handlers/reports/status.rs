//! Admin status transitions.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::api::handlers::auth::{AuthState, require_auth};

use super::storage::set_status as store_status;
use super::types::{ReportResponse, ReportStatus, SetStatusRequest};

#[utoipa::path(
    patch,
    path = "/v1/reports/{id}/status",
    params(("id" = String, Path, description = "Report id")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Report with its new status", body = ReportResponse),
        (status = 400, description = "Invalid status", body = String),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Admin only", body = String),
        (status = 404, description = "Unknown report", body = String)
    ),
    tag = "reports"
)]
pub async fn set_status(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<SetStatusRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &state).await {
        Ok(principal) => principal,
        Err(rejection) => return rejection.into_response(),
    };
    // The role comes from the database lookup in require_auth, not from the
    // token claim, so a demoted admin is stopped here.
    if !principal.is_admin() {
        return (StatusCode::FORBIDDEN, "Forbidden".to_string()).into_response();
    }

    let Some(report_id) = Uuid::parse_str(id.trim()).ok() else {
        return (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response();
    };

    let request: SetStatusRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Reports never go back to draft.
    let new_status = match ReportStatus::parse(request.status.trim()) {
        Some(status) if status.is_assignable() => status,
        _ => return (StatusCode::BAD_REQUEST, "Invalid status".to_string()).into_response(),
    };

    let change = match store_status(&pool, report_id, new_status).await {
        Ok(Some(change)) => change,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Report not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to set report status: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not set report status".to_string(),
            )
                .into_response();
        }
    };

    // Best effort: a failed notice never rolls back the transition.
    if let Err(err) = state.notifier().send_status_change(
        &change.owner_email,
        &change.owner_name,
        &change.report.title,
        change.old_status.as_str(),
        new_status.as_str(),
    ) {
        warn!("Failed to deliver status change notice: {err}");
    }

    (StatusCode::OK, Json(ReportResponse::from(change.report))).into_response()
}
