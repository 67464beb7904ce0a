//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{events, profile, registrations};
use crate::auth::handlers as auth_handlers;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// - Health checks (no authentication)
/// - Authentication endpoints under `/auth`
/// - Event, registration and profile endpoints under `/api`
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth_handlers::signup))
        .route("/login", post(auth_handlers::login))
        .route("/logout", post(auth_handlers::logout))
        .route("/logout-all", post(auth_handlers::logout_all))
        .route("/me", get(auth_handlers::me));

    let api_routes = Router::new()
        // Event browsing and admin CRUD
        .route("/events", get(events::list_events))
        .route("/events", post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id", put(events::update_event))
        .route("/events/:id", delete(events::delete_event))
        // Registration flow
        .route("/events/:id/register", post(registrations::register))
        .route("/registrations", get(registrations::list_my_registrations))
        .route("/registrations/:id", get(registrations::get_registration))
        // Profile
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_profile));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        // The browser client is served from a different origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
