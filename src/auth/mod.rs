//! Authentication: password hashing, server-side sessions, extractors and
//! HTTP handlers.
//!
//! Credentials are verified against Argon2id hashes and successful logins
//! mint an opaque bearer token backed by a server-side session record; no
//! password material is ever stored client-side.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod session;

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of the authentication layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email/password pair did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Session exists but has passed its expiry.
    #[error("session has expired")]
    SessionExpired,

    /// No session for the presented token.
    #[error("session not found")]
    SessionNotFound,

    /// Password hashing or verification failed.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// The session backend rejected or failed the operation.
    #[error("session store error: {0}")]
    Backend(String),
}

/// Validate email address format.
///
/// Basic shape check: exactly one `@`, non-empty local and domain parts, a
/// dotted domain, and a sane overall length. Anything stricter belongs to the
/// mail provider.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local) || !domain.chars().all(valid_domain) {
        return false;
    }

    // Domain labels between dots must be non-empty.
    domain.split('.').all(|part| !part.is_empty())
}
