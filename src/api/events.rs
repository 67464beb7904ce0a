//! Event management API endpoints.
//!
//! - GET /api/events - List events, optionally filtered by name substring
//! - GET /api/events/:id - Get event details
//! - POST /api/events - Create a new event (admin)
//! - PUT /api/events/:id - Update an event (admin)
//! - DELETE /api/events/:id - Delete an event (admin)

use crate::auth::middleware::RequireAdmin;
use crate::error::AppError;
use crate::server::state::AppState;
use crate::types::{Event, EventId, EventPatch, NewEvent};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing events.
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Case-insensitive substring filter on the event name.
    pub search: Option<String>,
}

/// Response for listing events.
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    /// Matching events, newest date first.
    pub events: Vec<Event>,
    /// Number of matching events.
    pub total: usize,
}

/// Request to create a new event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event name
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Venue / location text
    #[serde(default)]
    pub location: String,
    /// Event date
    pub date: NaiveDate,
    /// Display time range
    #[serde(default)]
    pub time: String,
    /// Display price
    #[serde(default)]
    pub price: String,
    /// Optional image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Seat capacity
    pub attendees: i32,
    /// Organizer display name; defaults to the creating admin's email
    #[serde(default)]
    pub organizer: Option<String>,
}

/// Request to update an event. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateEventRequest {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New location
    pub location: Option<String>,
    /// New date
    pub date: Option<NaiveDate>,
    /// New display time range
    pub time: Option<String>,
    /// New display price
    pub price: Option<String>,
    /// New image URL (`null` leaves it unchanged; use `""` to clear)
    pub image_url: Option<String>,
    /// Overwrite the remaining-seats counter
    pub attendees: Option<i32>,
    /// New organizer
    pub organizer: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List events, newest date first.
///
/// Public endpoint. `?search=` filters by case-insensitive substring match on
/// the name.
///
/// # Errors
///
/// 500 on backend failure.
pub async fn list_events(
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, AppError> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let events = state.events.list_events(search).await?;
    let total = events.len();

    Ok(Json(ListEventsResponse { events, total }))
}

/// Get event details by id.
///
/// Public endpoint.
///
/// # Errors
///
/// 404 if the event does not exist.
pub async fn get_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Event>, AppError> {
    let event = state
        .events
        .get_event(EventId(event_id))
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))?;

    Ok(Json(event))
}

/// Create a new event.
///
/// Requires the admin role.
///
/// # Errors
///
/// - 403 for non-admin sessions
/// - 422 for an empty name or negative capacity
pub async fn create_event(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::validation("Event name must not be empty"));
    }
    if request.attendees < 0 {
        return Err(AppError::validation("Attendee capacity must not be negative"));
    }

    let event = state
        .events
        .create_event(NewEvent {
            name: request.name.trim().to_string(),
            description: request.description,
            location: request.location,
            date: request.date,
            time: request.time,
            price: request.price,
            image_url: request.image_url,
            attendees: request.attendees,
            organizer: request.organizer.unwrap_or_else(|| admin.session.email.clone()),
        })
        .await?;

    info!(event_id = %event.id, admin = %admin.user_id, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

/// Update an event.
///
/// Requires the admin role. Overwriting `attendees` resets the
/// remaining-capacity counter.
///
/// # Errors
///
/// - 403 for non-admin sessions
/// - 404 if the event does not exist
/// - 422 for a negative capacity or empty name
pub async fn update_event(
    admin: RequireAdmin,
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("Event name must not be empty"));
        }
    }
    if let Some(attendees) = request.attendees {
        if attendees < 0 {
            return Err(AppError::validation("Attendee capacity must not be negative"));
        }
    }

    // Empty string clears the image; JSON null cannot be told apart from an
    // absent field by serde's Option here, so "" is the explicit clear marker.
    let image_url = request.image_url.map(|url| {
        let url = url.trim().to_string();
        if url.is_empty() { None } else { Some(url) }
    });

    let patch = EventPatch {
        name: request.name.map(|n| n.trim().to_string()),
        description: request.description,
        location: request.location,
        date: request.date,
        time: request.time,
        price: request.price,
        image_url,
        attendees: request.attendees,
        organizer: request.organizer,
    };

    let event = state.events.update_event(EventId(event_id), patch).await?;

    info!(event_id = %event.id, admin = %admin.user_id, "Event updated");

    Ok(Json(event))
}

/// Delete an event and its registrations.
///
/// Requires the admin role.
///
/// # Errors
///
/// - 403 for non-admin sessions
/// - 404 if the event does not exist
pub async fn delete_event(
    admin: RequireAdmin,
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.events.delete_event(EventId(event_id)).await?;

    info!(event_id = %event_id, admin = %admin.user_id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}
