//! Registration API endpoints.
//!
//! - POST /api/events/:id/register - Reserve one seat for the session user
//! - GET /api/registrations/:id - Confirmation lookup (owner only)
//! - GET /api/registrations - List the session user's registrations

use crate::auth::middleware::SessionUser;
use crate::error::AppError;
use crate::server::state::AppState;
use crate::types::{EventId, Registration, RegistrationId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use constant_time_eq::constant_time_eq;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response after a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Created registration id, shown on the confirmation screen.
    pub registration_id: String,
    /// The registered event.
    pub event_id: String,
    /// Seats remaining after this registration.
    pub seats_remaining: i32,
}

/// Response for listing the session user's registrations.
#[derive(Debug, Serialize)]
pub struct ListRegistrationsResponse {
    /// Registrations held by the session user, newest first.
    pub registrations: Vec<Registration>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Reserve one seat for the session user.
///
/// The decrement and the registration insert commit atomically in the data
/// store; under contention exactly `capacity` registrations can succeed and
/// the counter never goes negative.
///
/// # Errors
///
/// - 401 without a valid session
/// - 404 if the event does not exist
/// - 409 `SOLD_OUT` if no seats remain
/// - 409 `ALREADY_REGISTERED` for a repeat registration by the same email
pub async fn register(
    user: SessionUser,
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let outcome = state
        .registrations
        .register(EventId(event_id), &user.session.email)
        .await?;

    info!(
        registration_id = %outcome.registration.id,
        event_id = %event_id,
        user_id = %user.user_id,
        seats_remaining = outcome.seats_remaining,
        "Seat registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            registration_id: outcome.registration.id.to_string(),
            event_id: outcome.registration.event_id.to_string(),
            seats_remaining: outcome.seats_remaining,
        }),
    ))
}

/// Look up a registration for the confirmation screen.
///
/// Only the registration's owner may read it; a foreign registration id
/// answers 404 rather than 403 so ids cannot be probed for existence.
///
/// # Errors
///
/// - 401 without a valid session
/// - 404 if missing or owned by another user
pub async fn get_registration(
    user: SessionUser,
    Path(registration_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Registration>, AppError> {
    let registration = state
        .registrations
        .get_registration(RegistrationId(registration_id))
        .await?
        .ok_or_else(|| AppError::not_found("Registration", registration_id))?;

    if !constant_time_eq(
        registration.user_email.as_bytes(),
        user.session.email.as_bytes(),
    ) {
        return Err(AppError::not_found("Registration", registration_id));
    }

    Ok(Json(registration))
}

/// List the session user's registrations, newest first.
///
/// # Errors
///
/// 401 without a valid session.
pub async fn list_my_registrations(
    user: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<ListRegistrationsResponse>, AppError> {
    let registrations = state
        .registrations
        .list_registrations_for_email(&user.session.email)
        .await?;

    Ok(Json(ListRegistrationsResponse { registrations }))
}
