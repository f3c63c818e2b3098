//! Read-only reference data endpoints.

use axum::extract::{Query, State};

use super::{error, success, ApiResult};
use crate::models::{Alert, Hotspot, SensitiveArea, Ward, WardFilter};
use crate::AppState;

/// GET /api/wards - List all wards with their boundaries.
pub async fn list_wards(State(state): State<AppState>) -> ApiResult<Vec<Ward>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_wards().await {
        Ok(wards) => success(wards, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/hotspots?wardNo= - List flood-prone locations.
pub async fn list_hotspots(
    State(state): State<AppState>,
    Query(filter): Query<WardFilter>,
) -> ApiResult<Vec<Hotspot>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_hotspots(filter.ward_no).await {
        Ok(hotspots) => success(hotspots, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/sensitive-areas?wardNo= - List hospitals, schools and metro stations.
pub async fn list_sensitive_areas(
    State(state): State<AppState>,
    Query(filter): Query<WardFilter>,
) -> ApiResult<Vec<SensitiveArea>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_sensitive_areas(filter.ward_no).await {
        Ok(areas) => success(areas, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/alerts?wardNo= - List waterlogging alerts.
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(filter): Query<WardFilter>,
) -> ApiResult<Vec<Alert>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_alerts(filter.ward_no).await {
        Ok(alerts) => success(alerts, revision_id),
        Err(e) => error(e, revision_id),
    }
}
