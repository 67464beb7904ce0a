//! JSON API endpoints backing the application's screens.

pub mod events;
pub mod profile;
pub mod registrations;
