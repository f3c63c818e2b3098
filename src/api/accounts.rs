//! Account and session API endpoints.

use axum::{extract::State, Extension, Json};

use super::{error, success, ApiResult};
use crate::auth::{self, CurrentUser};
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, Role, SignupRequest, UpdateProfileRequest, User};
use crate::AppState;

/// POST /api/auth/signup - Register a new account.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match auth::signup(&state.repo, &request).await {
        Ok(user) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(user, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/login - Log in through a role-specific form.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match auth::login(&state.repo, &request).await {
        Ok(response) => success(response, revision_id),
        Err(e) => {
            tracing::info!("Login rejected: {}", e.error_code());
            error(e, revision_id)
        }
    }
}

/// POST /api/auth/logout - End the current session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.clear_session().await {
        Ok(()) => {
            tracing::info!("User {} logged out", user.id);
            success((), revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/auth/me - Get the session user.
pub async fn current_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(user, revision_id)
}

/// PUT /api/auth/profile - Update the session user's profile.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return error(
            AppError::Validation("Name must not be empty".to_string()),
            revision_id,
        );
    }

    let request = UpdateProfileRequest {
        name: request.name.map(|n| n.trim().to_string()),
        ..request
    };

    match state.repo.update_profile(&user.id, &request).await {
        Ok(updated) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(updated, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/workers - List field workers of the ward admin's ward.
pub async fn list_workers(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<User>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = auth::require_role(&user, &[Role::WardAdmin]) {
        return error(e, revision_id);
    }

    match state.repo.list_field_workers(user.ward_no).await {
        Ok(workers) => success(workers, revision_id),
        Err(e) => error(e, revision_id),
    }
}
