//! Request/response types for report endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of report a citizen files.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    RedFlag,
    Intervention,
}

impl ReportType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RedFlag => "red-flag",
            Self::Intervention => "intervention",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "red-flag" => Some(Self::RedFlag),
            "intervention" => Some(Self::Intervention),
            _ => None,
        }
    }
}

/// Lifecycle state of a report. Reports start in `Draft` and never return to
/// it; administrators move them between the three post-draft states.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Draft,
    UnderInvestigation,
    Rejected,
    Resolved,
}

impl ReportStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::UnderInvestigation => "under-investigation",
            Self::Rejected => "rejected",
            Self::Resolved => "resolved",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "under-investigation" => Some(Self::UnderInvestigation),
            "rejected" => Some(Self::Rejected),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }

    /// Whether an administrator may assign this status. `Draft` is the
    /// starting state only.
    #[must_use]
    pub fn is_assignable(self) -> bool {
        self != Self::Draft
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateReportRequest {
    #[serde(rename = "type")]
    pub report_type: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub media: Option<Vec<String>>,
}

/// Partial update; absent fields are left unchanged. A present `media` field
/// replaces the stored list with the caller's retained set.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub media: Option<Vec<String>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ReportResponse {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub title: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub media: Vec<String>,
    pub status: ReportStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn report_type_round_trips_through_str() {
        assert_eq!(ReportType::parse("red-flag"), Some(ReportType::RedFlag));
        assert_eq!(
            ReportType::parse("intervention"),
            Some(ReportType::Intervention)
        );
        assert_eq!(ReportType::parse("complaint"), None);
        assert_eq!(ReportType::RedFlag.as_str(), "red-flag");
    }

    #[test]
    fn report_status_parse_and_assignability() {
        for status in [
            ReportStatus::Draft,
            ReportStatus::UnderInvestigation,
            ReportStatus::Rejected,
            ReportStatus::Resolved,
        ] {
            assert_eq!(ReportStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReportStatus::parse("open"), None);

        assert!(!ReportStatus::Draft.is_assignable());
        assert!(ReportStatus::UnderInvestigation.is_assignable());
        assert!(ReportStatus::Rejected.is_assignable());
        assert!(ReportStatus::Resolved.is_assignable());
    }

    #[test]
    fn statuses_serialize_kebab_case() -> Result<()> {
        assert_eq!(
            serde_json::to_string(&ReportStatus::UnderInvestigation)?,
            "\"under-investigation\""
        );
        assert_eq!(serde_json::to_string(&ReportType::RedFlag)?, "\"red-flag\"");
        Ok(())
    }

    #[test]
    fn create_request_accepts_type_field_name() -> Result<()> {
        let request: CreateReportRequest = serde_json::from_str(
            r#"{"type":"red-flag","title":"Bribe at permit office","description":"Details"}"#,
        )?;
        assert_eq!(request.report_type, "red-flag");
        assert!(request.latitude.is_none());
        assert!(request.media.is_none());
        Ok(())
    }

    #[test]
    fn update_request_defaults_to_no_changes() -> Result<()> {
        let request: UpdateReportRequest = serde_json::from_str("{}")?;
        assert!(request.title.is_none());
        assert!(request.media.is_none());
        Ok(())
    }
}
