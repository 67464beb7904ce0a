//! Profile API endpoints.
//!
//! - GET /api/profile - The session user's account
//! - PUT /api/profile - Update the display name (the only mutable field)

use crate::auth::handlers::UserResponse;
use crate::auth::middleware::SessionUser;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

/// Request to update the profile.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name
    pub name: String,
}

/// Return the session user's account.
///
/// # Errors
///
/// 401 without a valid session; 404 if the account was removed out-of-band.
pub async fn get_profile(
    user: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let account = state
        .users
        .get_user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", user.user_id))?;

    Ok(Json(account.into()))
}

/// Update the session user's display name.
///
/// # Errors
///
/// - 401 without a valid session
/// - 422 for an empty name
pub async fn update_profile(
    user: SessionUser,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }

    let account = state.users.update_user_name(user.user_id, name).await?;

    info!(user_id = %user.user_id, "Profile name updated");

    Ok(Json(account.into()))
}
