//! Authentication HTTP handlers: signup, login, logout, current user.

use super::middleware::SessionUser;
use super::{is_valid_email, password};
use crate::error::AppError;
use crate::server::state::AppState;
use crate::types::{NewUser, Session, SessionId, User, UserRole};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create an account.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Display name
    pub name: String,
    /// Email address (login identifier)
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Account role; defaults to `user`
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Request to log in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Public view of a user account. Never carries password material.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User id
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Account role, used by the client to route to the admin or events view
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

/// Response after a successful signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// The created account
    pub user: UserResponse,
}

/// Response after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Opaque bearer token for subsequent requests
    pub token: String,
    /// The authenticated account
    pub user: UserResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account.
///
/// `POST /auth/signup`
///
/// # Errors
///
/// - 422 if the email shape or password length is invalid
/// - 409 `EMAIL_TAKEN` if the email is already registered
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    if !is_valid_email(&request.email) {
        return Err(AppError::validation("Invalid email address"));
    }
    if request.password.len() < state.auth.min_password_len {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            state.auth.min_password_len
        )));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }

    let password_hash = password::hash_password(&request.password)?;
    let user = state
        .users
        .create_user(NewUser {
            email: request.email.trim().to_lowercase(),
            password_hash,
            name: request.name.trim().to_string(),
            role: request.role.unwrap_or(UserRole::User),
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse { user: user.into() }),
    ))
}

/// Log in with email and password.
///
/// `POST /auth/login`
///
/// Mints a server-side session and returns its opaque token; the response
/// carries the role so the client can route to the admin or events view.
///
/// # Errors
///
/// 401 `INVALID_CREDENTIALS` for a wrong password and for an unknown email
/// alike; unknown emails burn a hash computation so both paths cost the same.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = request.email.trim().to_lowercase();

    let Some(user) = state.users.get_user_by_email(&email).await? else {
        password::equalize_timing(&request.password);
        return Err(AppError::unauthorized("Invalid email or password"));
    };

    if !password::verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let ttl = Duration::seconds(i64::try_from(state.auth.session_ttl).unwrap_or(86_400));
    let now = Utc::now();
    let session = Session {
        session_id: SessionId::new(),
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
        created_at: now,
        expires_at: now + ttl,
    };
    state.sessions.create_session(&session, ttl).await?;

    info!(user_id = %user.id, session_id = %session.session_id, "User logged in");

    Ok(Json(LoginResponse {
        token: session.session_id.to_string(),
        user: user.into(),
    }))
}

/// Log out, deleting the session server-side.
///
/// `POST /auth/logout`
///
/// # Errors
///
/// 401 if the request carries no valid session.
pub async fn logout(
    user: SessionUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.sessions.delete_session(user.session.session_id).await?;

    info!(user_id = %user.user_id, "User logged out");

    Ok(StatusCode::NO_CONTENT)
}

/// Log out of every session held by the user.
///
/// `POST /auth/logout-all`
///
/// Deletes all of the user's sessions, including the one making the request.
/// Used after a password change or a suspected token leak.
///
/// # Errors
///
/// 401 if the request carries no valid session.
pub async fn logout_all(
    user: SessionUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let deleted = state.sessions.delete_user_sessions(user.user_id).await?;

    info!(user_id = %user.user_id, deleted, "User logged out everywhere");

    Ok(StatusCode::NO_CONTENT)
}

/// Return the authenticated user's account.
///
/// `GET /auth/me`
///
/// # Errors
///
/// 401 without a valid session; 404 if the account was removed out-of-band.
pub async fn me(
    user: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let account = state
        .users
        .get_user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", user.user_id))?;

    Ok(Json(account.into()))
}
