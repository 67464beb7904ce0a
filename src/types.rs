//! Core domain types for the event management service.
//!
//! Strongly-typed identifiers, the three persisted entities (users, events,
//! registrations) and the server-side session record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique user identifier.
    UserId
);
define_id!(
    /// Unique event identifier.
    EventId
);
define_id!(
    /// Unique registration identifier.
    RegistrationId
);
define_id!(
    /// Unique session identifier. The string form doubles as the bearer token.
    SessionId
);

// ============================================================================
// Users
// ============================================================================

/// Role attached to a user account.
///
/// Admins may create, edit and delete events; regular users may only browse
/// and register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular attendee account.
    User,
    /// Event administrator account.
    Admin,
}

impl UserRole {
    /// String form as stored in the `role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse the stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account.
///
/// `password_hash` holds an Argon2id PHC string and must never leave the
/// service; API responses use [`crate::auth::handlers::UserResponse`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Email address (unique key, used for login and registrations).
    pub email: String,
    /// Argon2id PHC password hash.
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// Account role.
    pub role: UserRole,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Argon2id PHC password hash.
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// Account role.
    pub role: UserRole,
}

// ============================================================================
// Events
// ============================================================================

/// A published event.
///
/// `attendees` is the remaining-capacity counter: it is decremented by each
/// registration through an atomic conditional update and never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,
    /// Event name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Venue / location text.
    pub location: String,
    /// Event date.
    pub date: NaiveDate,
    /// Display time range, e.g. "9:00 AM - 5:00 PM".
    pub time: String,
    /// Display price, e.g. "$299".
    pub price: String,
    /// Optional image URL.
    pub image_url: Option<String>,
    /// Remaining seats.
    pub attendees: i32,
    /// Organizer display name.
    pub organizer: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Event name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Venue / location text.
    pub location: String,
    /// Event date.
    pub date: NaiveDate,
    /// Display time range.
    pub time: String,
    /// Display price.
    pub price: String,
    /// Optional image URL.
    pub image_url: Option<String>,
    /// Seat capacity.
    pub attendees: i32,
    /// Organizer display name.
    pub organizer: String,
}

/// Partial update for an event. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New display time range.
    pub time: Option<String>,
    /// New display price.
    pub price: Option<String>,
    /// New image URL (`Some(None)` clears it).
    pub image_url: Option<Option<String>>,
    /// Overwrite the remaining-seats counter.
    pub attendees: Option<i32>,
    /// New organizer.
    pub organizer: Option<String>,
}

// ============================================================================
// Registrations
// ============================================================================

/// A seat registration linking a user (by email) to an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    /// Unique identifier, shown on the confirmation screen.
    pub id: RegistrationId,
    /// Registered event.
    pub event_id: EventId,
    /// Email of the registered user.
    pub user_email: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOutcome {
    /// The created registration row.
    pub registration: Registration,
    /// Seats remaining after the decrement.
    pub seats_remaining: i32,
}

// ============================================================================
// Sessions
// ============================================================================

/// Server-side session record.
///
/// Stored in the session store keyed by `session_id`; the client only ever
/// holds the opaque token. Display name is deliberately not cached here so
/// profile edits take effect immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier / bearer token.
    pub session_id: SessionId,
    /// Authenticated user.
    pub user_id: UserId,
    /// Email at login time.
    pub email: String,
    /// Role at login time.
    pub role: UserRole,
    /// Login timestamp.
    pub created_at: DateTime<Utc>,
    /// Hard expiry; requests after this instant are rejected.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has passed its hard expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
