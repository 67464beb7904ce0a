//! Authentication extractors.
//!
//! Axum extractors that gate handlers:
//! - [`BearerToken`]: raw token from the `Authorization` header
//! - [`SessionUser`]: validated session (401 otherwise)
//! - [`RequireAdmin`]: validated session with the admin role (403 otherwise)
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn get_profile(user: SessionUser) -> Result<Json<ProfileResponse>, AppError> {
//!     // user.session is guaranteed valid and unexpired
//! }
//!
//! async fn create_event(admin: RequireAdmin, ...) -> Result<..., AppError> {
//!     // admin.session.role is guaranteed to be Admin
//! }
//! ```

use crate::error::AppError;
use crate::server::state::AppState;
use crate::types::{Session, SessionId, UserId, UserRole};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Bearer token extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .to_string();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token))
    }
}

/// Authenticated session user.
///
/// Use as a handler parameter to require a valid, unexpired session.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The authenticated user id.
    pub user_id: UserId,
    /// The full session record.
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;

        let uuid = Uuid::parse_str(&bearer.0)
            .map_err(|_| AppError::unauthorized("Invalid session token format"))?;
        let session = state.sessions.get_session(SessionId(uuid)).await?;

        Ok(Self {
            user_id: session.user_id,
            session,
        })
    }
}

/// Authenticated admin user.
///
/// Validates the session like [`SessionUser`] and additionally requires the
/// admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    /// The authenticated admin user id.
    pub user_id: UserId,
    /// The full session record.
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionUser { user_id, session } =
            SessionUser::from_request_parts(parts, state).await?;

        if session.role != UserRole::Admin {
            return Err(AppError::forbidden("Admin access required"));
        }

        Ok(Self { user_id, session })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    #[test]
    fn bearer_prefix_parsing() {
        let header = "Bearer 550e8400-e29b-41d4-a716-446655440000";
        let token = header.strip_prefix("Bearer ").unwrap();
        assert_eq!(token, "550e8400-e29b-41d4-a716-446655440000");

        assert!("Basic dXNlcjpwYXNz".strip_prefix("Bearer ").is_none());
    }
}
