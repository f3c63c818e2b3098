//! Report API endpoints.
//!
//! Every successful mutation bumps the revision and notifies report
//! subscribers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;

use super::{error, success, ApiResult};
use crate::auth::{can_view_report, require_role, CurrentUser};
use crate::db::ReportScope;
use crate::errors::AppError;
use crate::geo;
use crate::lifecycle;
use crate::models::{
    AssignReportRequest, Assignment, AttachProofRequest, CreateReportRequest, FeedbackOutcome,
    FeedbackRequest, ProximityReport, Report, ReportState, Role, TransitionRequest,
    User,
};
use crate::AppState;

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Report {} not found", id))
}

/// Reports outside the caller's scope are reported as missing.
fn ensure_visible(user: &User, report: &Report) -> Result<(), AppError> {
    if can_view_report(user, report) {
        Ok(())
    } else {
        Err(not_found(report.id))
    }
}

fn scope_for(user: &User) -> ReportScope {
    match user.role {
        Role::User => ReportScope::Submitter(user.id.clone()),
        Role::WardAdmin => ReportScope::Ward(user.ward_no),
        Role::SuperAdmin => ReportScope::All,
        Role::FieldWorker => ReportScope::Worker(user.id.clone()),
    }
}

/// Apply a role-gated lifecycle transition and publish the change.
async fn apply_transition<F>(
    state: &AppState,
    user: &User,
    roles: &[Role],
    id: i64,
    expected_version: Option<i64>,
    transition: F,
) -> ApiResult<Report>
where
    F: FnOnce(&Report) -> Result<ReportState, AppError>,
{
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = require_role(user, roles) {
        return error(e, revision_id);
    }

    let result = state
        .repo
        .transition_report(id, expected_version, |report| {
            ensure_visible(user, report)?;
            transition(report)
        })
        .await;

    match result {
        Ok(report) => {
            tracing::info!("Report {} is now {}", report.id, report.status());
            state.events.notify();
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(report, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/reports - List the reports in the caller's scope.
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<Report>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_reports(&scope_for(&user)).await {
        Ok(reports) => success(reports, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/reports/:id - Get a single report.
pub async fn get_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Report> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_report(id).await {
        Ok(Some(report)) if can_view_report(&user, &report) => success(report, revision_id),
        Ok(_) => error(not_found(id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

async fn submit_report(
    state: &AppState,
    user: &User,
    request: &CreateReportRequest,
) -> Result<Report, AppError> {
    require_role(user, &[Role::User])?;

    let description = request.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation(
            "Please describe the waterlogging issue".to_string(),
        ));
    }

    let (latitude, longitude) = (request.latitude, request.longitude);
    if !geo::is_valid_coordinate(latitude, longitude) {
        return Err(AppError::Validation("Invalid coordinates".to_string()));
    }

    if let Some(boundary) = state
        .repo
        .get_ward(user.ward_no)
        .await?
        .and_then(|ward| ward.boundary)
    {
        if !geo::point_in_polygon((latitude, longitude), &boundary) {
            return Err(AppError::Validation(format!(
                "Location must be within {} ward",
                user.ward
            )));
        }
    }

    let areas = state.repo.list_sensitive_areas(Some(user.ward_no)).await?;
    let assessed = lifecycle::assess_priority(
        latitude,
        longitude,
        &areas,
        state.config.sensitive_radius_m,
    );

    let draft = Report {
        id: 0,
        user_id: user.id.clone(),
        user: user.name.clone(),
        description: description.to_string(),
        location: format!("{}, Delhi ({}, {})", user.ward, latitude, longitude),
        ward: user.ward.clone(),
        ward_no: user.ward_no,
        latitude,
        longitude,
        date: Utc::now().to_rfc3339(),
        image: request.image.clone().filter(|i| !i.is_empty()),
        priority: assessed.priority,
        priority_reason: assessed.priority_reason,
        near_sensitive_area: assessed.near_sensitive_area,
        sensitive_area_info: assessed.sensitive_area_info,
        state: ReportState::Pending,
        version: 1,
    };

    state.repo.create_report(&draft).await
}

/// POST /api/reports - Submit a new report.
pub async fn create_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateReportRequest>,
) -> ApiResult<Report> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match submit_report(&state, &user, &request).await {
        Ok(report) => {
            tracing::info!(
                "Report {} submitted in ward {} with {} priority",
                report.id,
                report.ward_no,
                report.priority.as_str()
            );
            state.events.notify();
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(report, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/reports/:id/assign - Assign a pending report to a field worker.
pub async fn assign_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<AssignReportRequest>,
) -> ApiResult<Report> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = require_role(&user, &[Role::WardAdmin]) {
        return error(e, revision_id);
    }

    let Some(worker_id) = request
        .worker_id
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
    else {
        return error(AppError::NoWorkerSelected, revision_id);
    };

    let worker = match state.repo.get_user(worker_id).await {
        Ok(Some(worker)) if worker.role == Role::FieldWorker && worker.ward_no == user.ward_no => {
            worker
        }
        Ok(_) => {
            return error(
                AppError::Validation(format!("Field worker {} not found in your ward", worker_id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    let assignment = Assignment {
        assigned_worker_id: worker.id,
        assigned_worker_name: worker.name,
        assigned_at: Utc::now().to_rfc3339(),
    };

    apply_transition(
        &state,
        &user,
        &[Role::WardAdmin],
        id,
        request.expected_version,
        |report| report.state.assign(assignment),
    )
    .await
}

/// POST /api/reports/:id/reject - Reject a pending report.
pub async fn reject_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Report> {
    let now = Utc::now().to_rfc3339();
    apply_transition(
        &state,
        &user,
        &[Role::WardAdmin],
        id,
        request.expected_version,
        |report| report.state.reject(&now),
    )
    .await
}

/// POST /api/reports/:id/start - Begin work on an assigned report.
pub async fn start_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Report> {
    let now = Utc::now().to_rfc3339();
    apply_transition(
        &state,
        &user,
        &[Role::FieldWorker],
        id,
        request.expected_version,
        |report| report.state.start(&user.id, &now),
    )
    .await
}

/// POST /api/reports/:id/proof - Attach completion proof.
pub async fn attach_proof(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<AttachProofRequest>,
) -> ApiResult<Report> {
    apply_transition(
        &state,
        &user,
        &[Role::FieldWorker],
        id,
        request.expected_version,
        |report| report.state.attach_proof(&user.id, &request.proof_url),
    )
    .await
}

/// POST /api/reports/:id/complete - Mark the work as completed.
pub async fn complete_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Report> {
    let now = Utc::now().to_rfc3339();
    apply_transition(
        &state,
        &user,
        &[Role::FieldWorker],
        id,
        request.expected_version,
        |report| report.state.complete(&user.id, &now),
    )
    .await
}

/// POST /api/reports/:id/resolve - Resolve a report.
pub async fn resolve_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Report> {
    let now = Utc::now().to_rfc3339();
    apply_transition(
        &state,
        &user,
        &[Role::WardAdmin],
        id,
        request.expected_version,
        |report| report.state.resolve(&now),
    )
    .await
}

fn already_rated(report: Report) -> FeedbackOutcome {
    FeedbackOutcome {
        recorded: false,
        message: "You have already submitted feedback for this report".to_string(),
        report,
    }
}

/// POST /api/reports/:id/feedback - Rate a resolved report, at most once.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<FeedbackOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = require_role(&user, &[Role::User]) {
        return error(e, revision_id);
    }

    let existing = match state.repo.get_report(id).await {
        Ok(Some(report)) if report.user_id == user.id => report,
        Ok(_) => return error(not_found(id), revision_id),
        Err(e) => return error(e, revision_id),
    };

    if existing.state.feedback().is_some() {
        return success(already_rated(existing), revision_id);
    }

    let now = Utc::now().to_rfc3339();
    let result = state
        .repo
        .transition_report(id, None, |report| {
            report.state.record_feedback(request.feedback, &now)
        })
        .await;

    match result {
        Ok(report) => {
            state.events.notify();
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(
                FeedbackOutcome {
                    recorded: true,
                    message: "Thank you for your feedback!".to_string(),
                    report,
                },
                new_revision,
            )
        }
        // A concurrent submission got there first
        Err(e @ (AppError::Conflict { .. } | AppError::InvalidTransition(_))) => {
            match state.repo.get_report(id).await {
                Ok(Some(report)) if report.state.feedback().is_some() => {
                    success(already_rated(report), revision_id)
                }
                Ok(_) => error(e, revision_id),
                Err(read_err) => error(read_err, revision_id),
            }
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/reports/:id - Delete a report.
pub async fn delete_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = require_role(&user, &[Role::WardAdmin]) {
        return error(e, revision_id);
    }

    match state.repo.get_report(id).await {
        Ok(Some(report)) if can_view_report(&user, &report) => {}
        Ok(_) => return error(not_found(id), revision_id),
        Err(e) => return error(e, revision_id),
    }

    match state.repo.delete_report(id).await {
        Ok(()) => {
            tracing::info!("Report {} deleted by {}", id, user.id);
            state.events.notify();
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/reports/:id/proximity - Nearest sensitive area to a report.
pub async fn get_report_proximity(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<ProximityReport> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let report = match state.repo.get_report(id).await {
        Ok(Some(report)) if can_view_report(&user, &report) => report,
        Ok(_) => return error(not_found(id), revision_id),
        Err(e) => return error(e, revision_id),
    };

    let areas = match state.repo.list_sensitive_areas(Some(report.ward_no)).await {
        Ok(areas) => areas,
        Err(e) => return error(e, revision_id),
    };

    let radius_m = state.config.sensitive_radius_m;
    let nearest = geo::nearest_within((report.latitude, report.longitude), &areas, radius_m);

    success(
        ProximityReport {
            report_id: report.id,
            is_near: nearest.as_ref().is_some_and(|p| p.is_near),
            nearest_area: nearest.as_ref().map(|p| p.area.clone()),
            distance_m: nearest.as_ref().map(|p| p.distance_m.round()),
            radius_m,
        },
        revision_id,
    )
}
