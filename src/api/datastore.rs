//! City-wide snapshot and revision endpoints.

use axum::{extract::State, Extension};

use super::{error, success, ApiResult};
use crate::auth::{require_role, CurrentUser};
use crate::models::{Datastore, RevisionInfo, Role};
use crate::AppState;

/// GET /api/datastore - Every account and report, for the super admin.
pub async fn get_datastore(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Datastore> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = require_role(&user, &[Role::SuperAdmin]) {
        return error(e, revision_id);
    }

    match state.repo.get_datastore().await {
        Ok(datastore) => {
            tracing::debug!(
                "Snapshot with {} users and {} reports",
                datastore.users.len(),
                datastore.reports.len()
            );
            let snapshot_revision = datastore.revision_id;
            success(datastore, snapshot_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/datastore/revision - Cheap change check for polling clients.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}
