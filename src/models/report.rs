//! Citizen report model and its lifecycle states.

use serde::{Deserialize, Serialize};

use super::SensitiveArea;

/// Report priority. Creation only ever yields `Medium` or `High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            "Critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// Flat status name, used for filtering and stored alongside the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReportStatus {
    Pending,
    Assigned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Work Completed")]
    WorkCompleted,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Assigned => "Assigned",
            ReportStatus::InProgress => "In Progress",
            ReportStatus::WorkCompleted => "Work Completed",
            ReportStatus::Resolved => "Resolved",
            ReportStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(ReportStatus::Pending),
            "Assigned" => Some(ReportStatus::Assigned),
            "In Progress" => Some(ReportStatus::InProgress),
            "Work Completed" => Some(ReportStatus::WorkCompleted),
            "Resolved" => Some(ReportStatus::Resolved),
            "Rejected" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }

    /// Statuses still awaiting action.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ReportStatus::Pending
                | ReportStatus::Assigned
                | ReportStatus::InProgress
                | ReportStatus::WorkCompleted
        )
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Citizen satisfaction with a resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

/// Feedback recorded once on a resolved report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub feedback: Feedback,
    pub feedback_date: String,
}

/// Field worker chosen by the ward admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub assigned_worker_id: String,
    pub assigned_worker_name: String,
    pub assigned_at: String,
}

/// How a report reached `Resolved`. On the wire the path sits next to the
/// other report fields as `resolutionPath`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "resolutionPath",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Resolution {
    /// Admin verified completed work backed by a proof image.
    Verified {
        #[serde(flatten)]
        assignment: Assignment,
        worker_started_at: String,
        worker_completed_at: String,
        completion_proof_url: String,
    },
    /// Admin resolved an in-progress report without the completion gate.
    AdminOverride {
        #[serde(flatten)]
        assignment: Assignment,
        worker_started_at: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_proof_url: Option<String>,
    },
}

impl Resolution {
    pub fn assignment(&self) -> &Assignment {
        match self {
            Resolution::Verified { assignment, .. } => assignment,
            Resolution::AdminOverride { assignment, .. } => assignment,
        }
    }
}

/// Lifecycle state of a report. Each variant carries exactly the fields
/// that exist in that state; nested records are flattened so a report reads
/// as one flat object keyed by `status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all_fields = "camelCase")]
pub enum ReportState {
    Pending,
    Assigned {
        #[serde(flatten)]
        assignment: Assignment,
    },
    #[serde(rename = "In Progress")]
    InProgress {
        #[serde(flatten)]
        assignment: Assignment,
        worker_started_at: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_proof_url: Option<String>,
    },
    #[serde(rename = "Work Completed")]
    WorkCompleted {
        #[serde(flatten)]
        assignment: Assignment,
        worker_started_at: String,
        worker_completed_at: String,
        completion_proof_url: String,
    },
    Resolved {
        #[serde(flatten)]
        resolution: Resolution,
        resolved_at: String,
        #[serde(flatten)]
        feedback: Option<FeedbackRecord>,
    },
    Rejected {
        rejected_at: String,
    },
}

/// A waterlogging report submitted by a citizen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub user_id: String,
    /// Submitter name at the time of submission
    pub user: String,
    pub description: String,
    pub location: String,
    pub ward: String,
    pub ward_no: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_reason: Option<String>,
    pub near_sensitive_area: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive_area_info: Option<SensitiveArea>,
    #[serde(flatten)]
    pub state: ReportState,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Report {
    pub fn status(&self) -> ReportStatus {
        self.state.status()
    }
}

/// Request body for submitting a report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub image: Option<String>,
}

/// Request body shared by transitions that take no extra input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for assigning a report to a field worker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignReportRequest {
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for attaching completion proof.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachProofRequest {
    pub proof_url: String,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for citizen feedback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub feedback: Feedback,
}

/// Result of a feedback submission. A repeat submission is not an error:
/// `recorded` is false and the report is returned untouched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackOutcome {
    pub recorded: bool,
    pub message: String,
    pub report: Report,
}

/// Nearest sensitive area for a report, as shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityReport {
    pub report_id: i64,
    pub is_near: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_area: Option<SensitiveArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    pub radius_m: f64,
}
