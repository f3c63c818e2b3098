//! Dashboard statistics endpoints.

use axum::{extract::State, Extension};
use chrono::Utc;

use super::{error, success, ApiResult};
use crate::auth::{require_role, CurrentUser};
use crate::db::ReportScope;
use crate::errors::AppError;
use crate::models::{CityStats, Role, User, WardStats, WorkerStats};
use crate::stats;
use crate::AppState;

async fn compute_ward_stats(state: &AppState, user: &User) -> Result<WardStats, AppError> {
    require_role(user, &[Role::WardAdmin])?;
    let total_users = state.repo.count_users_in_ward(user.ward_no).await?;
    let reports = state
        .repo
        .list_reports(&ReportScope::Ward(user.ward_no))
        .await?;
    Ok(stats::ward_stats(
        &user.ward,
        user.ward_no,
        total_users.max(0) as usize,
        &reports,
        Utc::now().date_naive(),
    ))
}

async fn compute_city_stats(state: &AppState, user: &User) -> Result<CityStats, AppError> {
    require_role(user, &[Role::SuperAdmin])?;
    let wards = state.repo.list_wards().await?;
    let alerts = state.repo.list_alerts(None).await?;
    let reports = state.repo.list_reports(&ReportScope::All).await?;
    Ok(stats::city_stats(&wards, &alerts, &reports))
}

async fn compute_worker_stats(state: &AppState, user: &User) -> Result<WorkerStats, AppError> {
    require_role(user, &[Role::FieldWorker])?;
    let reports = state
        .repo
        .list_reports(&ReportScope::Worker(user.id.clone()))
        .await?;
    Ok(stats::worker_stats(&reports))
}

/// GET /api/stats/ward - Ward admin dashboard numbers.
pub async fn get_ward_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<WardStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match compute_ward_stats(&state, &user).await {
        Ok(stats) => success(stats, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/stats/city - Super admin dashboard numbers.
pub async fn get_city_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<CityStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match compute_city_stats(&state, &user).await {
        Ok(stats) => success(stats, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/stats/worker - Field worker performance numbers.
pub async fn get_worker_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<WorkerStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match compute_worker_stats(&state, &user).await {
        Ok(stats) => success(stats, revision_id),
        Err(e) => error(e, revision_id),
    }
}
