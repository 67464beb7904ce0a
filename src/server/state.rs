//! Application state for the HTTP server.

use crate::auth::session::SessionStore;
use crate::config::AuthConfig;
use crate::store::{EventStore, RegistrationStore, UserStore};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Handlers see only the store traits, so the same router runs over the
/// `PostgreSQL`/Redis stores in production and over the in-memory stores in
/// tests. Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// User account storage
    pub users: Arc<dyn UserStore>,
    /// Event storage
    pub events: Arc<dyn EventStore>,
    /// Registration storage (seat-reserving write path)
    pub registrations: Arc<dyn RegistrationStore>,
    /// Session storage
    pub sessions: Arc<dyn SessionStore>,
    /// Authentication settings (session TTL, password policy)
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        sessions: Arc<dyn SessionStore>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            users,
            events,
            registrations,
            sessions,
            auth: Arc::new(auth),
        }
    }
}
