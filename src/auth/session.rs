//! Server-side session storage.
//!
//! Sessions are ephemeral records keyed by an opaque token; Redis holds them
//! in production with TTL-based expiration, and an in-memory implementation
//! backs the test suite.
//!
//! # Redis layout
//!
//! - **Primary key**: `session:{session_id}` → JSON-serialized [`Session`]
//! - **User index**: `user:{user_id}:sessions` (Set) → session ids, used for
//!   logout-everywhere; TTL is one day longer than the sessions it indexes

use super::{AuthError, Result};
use crate::types::{Session, SessionId, UserId};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session store.
///
/// Sessions are short-lived (24-hour default TTL) and fast to look up; a
/// missing or expired session is an authentication failure, not a backend
/// error.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails or the session id already exists.
    async fn create_session(&self, session: &Session, ttl: Duration) -> Result<()>;

    /// Get a session by id.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] if no session exists for the id
    /// - [`AuthError::SessionExpired`] if the session passed its expiry
    async fn get_session(&self, session_id: SessionId) -> Result<Session>;

    /// Delete a session (logout).
    ///
    /// Deleting a session that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    async fn delete_session(&self, session_id: SessionId) -> Result<()>;

    /// Delete all sessions for a user, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    async fn delete_user_sessions(&self, user_id: UserId) -> Result<usize>;

    /// Cheap backend liveness probe for the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    async fn ping(&self) -> Result<()>;
}

// ============================================================================
// Redis implementation
// ============================================================================

fn backend_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Backend(e.to_string())
}

/// Redis-based session store with TTL-based expiration.
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    ///
    /// # Errors
    ///
    /// Returns error if the connection to Redis fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(backend_err)?;
        let conn_manager = ConnectionManager::new(client).await.map_err(backend_err)?;
        Ok(Self { conn_manager })
    }

    fn session_key(session_id: SessionId) -> String {
        format!("session:{session_id}")
    }

    fn user_sessions_key(user_id: UserId) -> String {
        format!("user:{user_id}:sessions")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create_session(&self, session: &Session, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session.session_id);
        let user_sessions_key = Self::user_sessions_key(session.user_id);

        // Rejecting an existing id closes the session-fixation hole: a token
        // is only ever valid if this store minted the record behind it.
        let exists: bool = conn.exists(&session_key).await.map_err(backend_err)?;
        if exists {
            return Err(AuthError::Backend("session id already exists".to_string()));
        }

        let payload = serde_json::to_string(session).map_err(backend_err)?;
        let ttl_seconds = u64::try_from(ttl.num_seconds()).unwrap_or(0);

        let () = conn
            .set_ex(&session_key, payload, ttl_seconds)
            .await
            .map_err(backend_err)?;

        // Index set outlives its sessions by a day so logout-everywhere can
        // still find tokens created just before a TTL refresh.
        let () = conn
            .sadd(&user_sessions_key, session.session_id.to_string())
            .await
            .map_err(backend_err)?;
        let index_ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX).saturating_add(86_400);
        let () = conn
            .expire(&user_sessions_key, index_ttl)
            .await
            .map_err(backend_err)?;

        Ok(())
    }

    async fn get_session(&self, session_id: SessionId) -> Result<Session> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session_id);

        let payload: Option<String> = conn.get(&session_key).await.map_err(backend_err)?;
        let payload = payload.ok_or(AuthError::SessionNotFound)?;
        let session: Session = serde_json::from_str(&payload).map_err(backend_err)?;

        // Redis TTL normally expires the key first; the hard expiry stored in
        // the record is authoritative if clocks and TTLs disagree.
        if session.is_expired(Utc::now()) {
            let () = conn.del(&session_key).await.map_err(backend_err)?;
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    async fn delete_session(&self, session_id: SessionId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let session_key = Self::session_key(session_id);

        let payload: Option<String> = conn.get(&session_key).await.map_err(backend_err)?;
        let () = conn.del(&session_key).await.map_err(backend_err)?;

        // Drop the id from the user index when the record is still readable.
        if let Some(payload) = payload {
            if let Ok(session) = serde_json::from_str::<Session>(&payload) {
                let user_sessions_key = Self::user_sessions_key(session.user_id);
                let () = conn
                    .srem(&user_sessions_key, session_id.to_string())
                    .await
                    .map_err(backend_err)?;
            }
        }

        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: UserId) -> Result<usize> {
        let mut conn = self.conn_manager.clone();
        let user_sessions_key = Self::user_sessions_key(user_id);

        let ids: Vec<String> = conn.smembers(&user_sessions_key).await.map_err(backend_err)?;
        let mut deleted = 0usize;
        for id in &ids {
            let removed: i64 = conn
                .del(format!("session:{id}"))
                .await
                .map_err(backend_err)?;
            deleted += usize::try_from(removed).unwrap_or(0);
        }
        let () = conn.del(&user_sessions_key).await.map_err(backend_err)?;

        Ok(deleted)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: bool = conn.exists("eventflow:ping").await.map_err(backend_err)?;
        Ok(())
    }
}

// ============================================================================
// In-memory implementation (tests)
// ============================================================================

/// In-memory session store used by the test suite.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, session: &Session, _ttl: Duration) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.session_id) {
            return Err(AuthError::Backend("session id already exists".to_string()));
        }
        sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: SessionId) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get(&session_id)
            .cloned()
            .ok_or(AuthError::SessionNotFound)?;
        if session.is_expired(Utc::now()) {
            sessions.remove(&session_id);
            return Err(AuthError::SessionExpired);
        }
        Ok(session)
    }

    async fn delete_session(&self, session_id: SessionId) -> Result<()> {
        self.sessions.write().await.remove(&session_id);
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: UserId) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok(before - sessions.len())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::UserRole;

    fn session(expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            session_id: SessionId::new(),
            user_id: UserId::new(),
            email: "user@example.com".to_string(),
            role: UserRole::User,
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemorySessionStore::new();
        let s = session(Duration::hours(24));
        store.create_session(&s, Duration::hours(24)).await.unwrap();

        let loaded = store.get_session(s.session_id).await.unwrap();
        assert_eq!(loaded, s);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = MemorySessionStore::new();
        let err = store.get_session(SessionId::new()).await.unwrap_err();
        assert_eq!(err, AuthError::SessionNotFound);
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_purged() {
        let store = MemorySessionStore::new();
        let s = session(Duration::seconds(-1));
        store.create_session(&s, Duration::hours(24)).await.unwrap();

        let err = store.get_session(s.session_id).await.unwrap_err();
        assert_eq!(err, AuthError::SessionExpired);

        let err = store.get_session(s.session_id).await.unwrap_err();
        assert_eq!(err, AuthError::SessionNotFound);
    }

    #[tokio::test]
    async fn duplicate_session_id_is_rejected() {
        let store = MemorySessionStore::new();
        let s = session(Duration::hours(1));
        store.create_session(&s, Duration::hours(1)).await.unwrap();
        assert!(store.create_session(&s, Duration::hours(1)).await.is_err());
    }

    #[tokio::test]
    async fn delete_user_sessions_removes_all_of_them() {
        let store = MemorySessionStore::new();
        let mut a = session(Duration::hours(1));
        let mut b = session(Duration::hours(1));
        let user_id = UserId::new();
        a.user_id = user_id;
        b.user_id = user_id;
        let other = session(Duration::hours(1));

        store.create_session(&a, Duration::hours(1)).await.unwrap();
        store.create_session(&b, Duration::hours(1)).await.unwrap();
        store
            .create_session(&other, Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.delete_user_sessions(user_id).await.unwrap(), 2);
        assert!(store.get_session(other.session_id).await.is_ok());
    }
}
