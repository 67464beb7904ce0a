//! Eventflow: an event management service.
//!
//! Public-facing event browsing, authenticated seat registration and
//! admin-only event management over a JSON HTTP API.
//!
//! # Architecture
//!
//! - [`types`]: Domain types (users, events, registrations, sessions)
//! - [`store`]: Persistence traits with `PostgreSQL` and in-memory backends
//! - [`auth`]: Password hashing, session stores, extractors and handlers
//! - [`api`]: Event, registration and profile handlers
//! - [`server`]: Application state, router and health endpoints
//! - [`config`]: Environment-driven configuration
//! - [`error`]: The `AppError` HTTP error type
//!
//! Seat inventory is enforced in storage: a registration only succeeds if a
//! conditional decrement of the event's seat count succeeds in the same
//! transaction, so concurrent registrations can never oversell an event.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::AppError;
pub use server::{build_router, AppState};
