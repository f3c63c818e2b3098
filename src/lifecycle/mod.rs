//! Report lifecycle: priority classification at creation and the
//! role-gated transition graph.
//!
//! ```text
//! Pending ──assign──▶ Assigned ──start──▶ In Progress ──complete──▶ Work Completed
//!    │                                        │                          │
//!    └─reject─▶ Rejected                      └──resolve (override)──┐   └─resolve (verified)─┐
//!                                                                    ▼                        ▼
//!                                                                 Resolved ◀──────────────────┘
//! ```
//!
//! Transitions are pure: they take the current state and return the next
//! one, leaving persistence and version checks to the repository.

use crate::errors::AppError;
use crate::geo;
use crate::models::{
    Assignment, Feedback, FeedbackRecord, Priority, ReportState, ReportStatus, Resolution,
    SensitiveArea,
};

/// Derived priority fields for a new report.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityAssessment {
    pub priority: Priority,
    pub priority_reason: Option<String>,
    pub near_sensitive_area: bool,
    pub sensitive_area_info: Option<SensitiveArea>,
}

/// Classify a new report by its distance to the ward's sensitive areas.
pub fn assess_priority(
    latitude: f64,
    longitude: f64,
    areas: &[SensitiveArea],
    radius_m: f64,
) -> PriorityAssessment {
    match geo::nearest_within((latitude, longitude), areas, radius_m) {
        Some(found) if found.is_near => PriorityAssessment {
            priority: Priority::High,
            priority_reason: Some(format!(
                "Near Sensitive Area ({})",
                found.area.area_type.as_str()
            )),
            near_sensitive_area: true,
            sensitive_area_info: Some(found.area.clone()),
        },
        _ => PriorityAssessment {
            priority: Priority::Medium,
            priority_reason: None,
            near_sensitive_area: false,
            sensitive_area_info: None,
        },
    }
}

fn invalid(action: &str, from: ReportStatus) -> AppError {
    AppError::InvalidTransition(format!("Cannot {} a report that is {}", action, from))
}

fn ensure_assigned_to(assignment: &Assignment, worker_id: &str) -> Result<(), AppError> {
    if assignment.assigned_worker_id != worker_id {
        return Err(AppError::Forbidden(
            "Report is assigned to another field worker".to_string(),
        ));
    }
    Ok(())
}

impl ReportState {
    pub fn status(&self) -> ReportStatus {
        match self {
            ReportState::Pending => ReportStatus::Pending,
            ReportState::Assigned { .. } => ReportStatus::Assigned,
            ReportState::InProgress { .. } => ReportStatus::InProgress,
            ReportState::WorkCompleted { .. } => ReportStatus::WorkCompleted,
            ReportState::Resolved { .. } => ReportStatus::Resolved,
            ReportState::Rejected { .. } => ReportStatus::Rejected,
        }
    }

    /// Worker assignment, present from `Assigned` onwards.
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            ReportState::Pending | ReportState::Rejected { .. } => None,
            ReportState::Assigned { assignment }
            | ReportState::InProgress { assignment, .. }
            | ReportState::WorkCompleted { assignment, .. } => Some(assignment),
            ReportState::Resolved { resolution, .. } => Some(resolution.assignment()),
        }
    }

    pub fn completion_proof_url(&self) -> Option<&str> {
        match self {
            ReportState::InProgress {
                completion_proof_url,
                ..
            } => completion_proof_url.as_deref(),
            ReportState::WorkCompleted {
                completion_proof_url,
                ..
            } => Some(completion_proof_url),
            ReportState::Resolved { resolution, .. } => match resolution {
                Resolution::Verified {
                    completion_proof_url,
                    ..
                } => Some(completion_proof_url),
                Resolution::AdminOverride {
                    completion_proof_url,
                    ..
                } => completion_proof_url.as_deref(),
            },
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<&FeedbackRecord> {
        match self {
            ReportState::Resolved { feedback, .. } => feedback.as_ref(),
            _ => None,
        }
    }

    /// Ward admin hands a pending report to a field worker.
    pub fn assign(&self, assignment: Assignment) -> Result<ReportState, AppError> {
        match self {
            ReportState::Pending => Ok(ReportState::Assigned { assignment }),
            other => Err(invalid("assign", other.status())),
        }
    }

    /// Ward admin turns down a pending report.
    pub fn reject(&self, now: &str) -> Result<ReportState, AppError> {
        match self {
            ReportState::Pending => Ok(ReportState::Rejected {
                rejected_at: now.to_string(),
            }),
            other => Err(invalid("reject", other.status())),
        }
    }

    /// Assigned worker begins work.
    pub fn start(&self, worker_id: &str, now: &str) -> Result<ReportState, AppError> {
        match self {
            ReportState::Assigned { assignment } => {
                ensure_assigned_to(assignment, worker_id)?;
                Ok(ReportState::InProgress {
                    assignment: assignment.clone(),
                    worker_started_at: now.to_string(),
                    completion_proof_url: None,
                })
            }
            other => Err(invalid("start", other.status())),
        }
    }

    /// Assigned worker attaches (or replaces) the completion proof.
    pub fn attach_proof(&self, worker_id: &str, proof_url: &str) -> Result<ReportState, AppError> {
        if proof_url.trim().is_empty() {
            return Err(AppError::Validation(
                "Completion proof must not be empty".to_string(),
            ));
        }

        match self {
            ReportState::InProgress {
                assignment,
                worker_started_at,
                ..
            } => {
                ensure_assigned_to(assignment, worker_id)?;
                Ok(ReportState::InProgress {
                    assignment: assignment.clone(),
                    worker_started_at: worker_started_at.clone(),
                    completion_proof_url: Some(proof_url.to_string()),
                })
            }
            other => Err(invalid("attach proof to", other.status())),
        }
    }

    /// Assigned worker marks the work done. Requires a proof image.
    pub fn complete(&self, worker_id: &str, now: &str) -> Result<ReportState, AppError> {
        match self {
            ReportState::InProgress {
                assignment,
                worker_started_at,
                ..
            } => {
                ensure_assigned_to(assignment, worker_id)?;
                let proof = self
                    .completion_proof_url()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or(AppError::MissingCompletionProof)?;
                Ok(ReportState::WorkCompleted {
                    assignment: assignment.clone(),
                    worker_started_at: worker_started_at.clone(),
                    worker_completed_at: now.to_string(),
                    completion_proof_url: proof.to_string(),
                })
            }
            other => Err(invalid("complete", other.status())),
        }
    }

    /// Ward admin closes the report. From `Work Completed` this is a
    /// verification; from `In Progress` it is recorded as an override.
    pub fn resolve(&self, now: &str) -> Result<ReportState, AppError> {
        let resolution = match self {
            ReportState::WorkCompleted {
                assignment,
                worker_started_at,
                worker_completed_at,
                completion_proof_url,
            } => Resolution::Verified {
                assignment: assignment.clone(),
                worker_started_at: worker_started_at.clone(),
                worker_completed_at: worker_completed_at.clone(),
                completion_proof_url: completion_proof_url.clone(),
            },
            ReportState::InProgress {
                assignment,
                worker_started_at,
                completion_proof_url,
            } => Resolution::AdminOverride {
                assignment: assignment.clone(),
                worker_started_at: worker_started_at.clone(),
                completion_proof_url: completion_proof_url.clone(),
            },
            other => return Err(invalid("resolve", other.status())),
        };

        Ok(ReportState::Resolved {
            resolution,
            resolved_at: now.to_string(),
            feedback: None,
        })
    }

    /// Citizen rates a resolved report. Feedback is written at most once.
    pub fn record_feedback(&self, feedback: Feedback, now: &str) -> Result<ReportState, AppError> {
        match self {
            ReportState::Resolved {
                resolution,
                resolved_at,
                feedback: None,
            } => Ok(ReportState::Resolved {
                resolution: resolution.clone(),
                resolved_at: resolved_at.clone(),
                feedback: Some(FeedbackRecord {
                    feedback,
                    feedback_date: now.to_string(),
                }),
            }),
            ReportState::Resolved { .. } => Err(AppError::InvalidTransition(
                "Feedback has already been submitted for this report".to_string(),
            )),
            other => Err(invalid("give feedback on", other.status())),
        }
    }
}
