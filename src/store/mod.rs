//! Persistence layer: store traits and their implementations.
//!
//! Handlers depend only on the traits in this module; [`postgres`] provides
//! the production implementation and [`memory`] an in-process stand-in used
//! by the test suite.

pub mod memory;
pub mod postgres;

use crate::types::{
    Event, EventId, EventPatch, NewEvent, NewUser, Registration, RegistrationId,
    RegistrationOutcome, User, UserId,
};
use async_trait::async_trait;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure modes of the persistence layer.
///
/// Distinct variants exist for every outcome the API must distinguish.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A user with this email already exists.
    #[error("email already registered")]
    DuplicateEmail,

    /// This email already holds a registration for this event.
    #[error("already registered for this event")]
    AlreadyRegistered,

    /// The event has no seats remaining.
    #[error("event is sold out")]
    SoldOut,

    /// The backend rejected or failed the operation.
    #[error("database error: {0}")]
    Database(String),
}

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateEmail`] if the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns error only on backend failure; a missing user is `Ok(None)`.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns error only on backend failure; a missing user is `Ok(None)`.
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<User>>;

    /// Update a user's display name, the only profile field that is mutable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the user does not exist.
    async fn update_user_name(&self, user_id: UserId, name: &str) -> Result<User>;
}

/// Storage for events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// List events, newest date first.
    ///
    /// `search` filters by case-insensitive substring match on the name.
    ///
    /// # Errors
    ///
    /// Returns error on backend failure.
    async fn list_events(&self, search: Option<&str>) -> Result<Vec<Event>>;

    /// Look up an event by id.
    ///
    /// # Errors
    ///
    /// Returns error only on backend failure; a missing event is `Ok(None)`.
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>>;

    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// Returns error on backend failure.
    async fn create_event(&self, new_event: NewEvent) -> Result<Event>;

    /// Apply a partial update to an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist.
    async fn update_event(&self, event_id: EventId, patch: EventPatch) -> Result<Event>;

    /// Delete an event and cascade its registrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist.
    async fn delete_event(&self, event_id: EventId) -> Result<()>;

    /// Cheap backend liveness probe for the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    async fn ping(&self) -> Result<()>;
}

/// Storage for registrations, including the seat-reserving write path.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Reserve one seat: atomically decrement the event's remaining-capacity
    /// counter and insert the registration row, both or neither.
    ///
    /// The decrement is conditional on `attendees > 0` and applied by the
    /// data store in a single round trip, so concurrent registrations can
    /// never lose an update or drive the counter negative.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the event does not exist
    /// - [`StoreError::SoldOut`] if no seats remain
    /// - [`StoreError::AlreadyRegistered`] if this email already holds a
    ///   registration for the event (the decrement is rolled back)
    async fn register(&self, event_id: EventId, user_email: &str)
        -> Result<RegistrationOutcome>;

    /// Look up a registration by id (confirmation screen).
    ///
    /// # Errors
    ///
    /// Returns error only on backend failure; a missing row is `Ok(None)`.
    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<Registration>>;

    /// List all registrations held by an email, newest first.
    ///
    /// # Errors
    ///
    /// Returns error on backend failure.
    async fn list_registrations_for_email(&self, email: &str) -> Result<Vec<Registration>>;
}
