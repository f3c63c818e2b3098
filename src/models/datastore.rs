//! Datastore snapshot and dashboard statistics models.

use serde::{Deserialize, Serialize};

use super::{Report, User};

/// City-wide snapshot of accounts and reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub schema_version: i32,
    pub generated_at: String,
    pub revision_id: i64,
    pub users: Vec<User>,
    pub reports: Vec<Report>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}

/// Numbers behind the ward admin dashboard.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WardStats {
    pub ward: String,
    pub ward_no: i64,
    pub total_users: usize,
    pub total_reports: usize,
    pub active_reports: usize,
    pub resolved_today: usize,
    pub positive_feedback: usize,
    pub negative_feedback: usize,
    pub resolved_with_feedback: usize,
    pub total_resolved: usize,
}

/// Numbers behind the super admin dashboard.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    pub total_wards: usize,
    pub total_hotspots: i64,
    pub high_risk_wards: usize,
    pub active_alerts: usize,
    pub total_reports: usize,
    pub pending_reports: usize,
    pub in_progress_reports: usize,
    pub resolved_reports: usize,
    pub average_readiness: i64,
}

/// Completed task count for one day.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

/// Report count for one priority level.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCount {
    pub priority: String,
    pub count: usize,
}

/// Numbers behind the field worker analytics page.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    pub total_tasks: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_resolution_hours: Option<f64>,
    pub completed_by_date: Vec<DailyCount>,
    pub by_priority: Vec<PriorityCount>,
}
