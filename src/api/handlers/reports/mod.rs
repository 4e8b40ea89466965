//! Report lifecycle engine: ownership, draft gating, admin transitions.

pub(crate) mod reports;
pub(crate) mod status;
pub(crate) mod storage;
pub(crate) mod types;

pub use types::{ReportStatus, ReportType};
