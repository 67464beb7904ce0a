//! `PostgreSQL` store implementation.
//!
//! Uses the sqlx runtime query API against three tables (`users`, `events`,
//! `registrations`). The schema lives under `migrations/` and enforces the
//! invariants the handlers rely on: unique emails, `attendees >= 0`, and a
//! unique `(event_id, user_email)` pair.

use super::{EventStore, RegistrationStore, Result, StoreError, UserStore};
use crate::types::{
    Event, EventId, EventPatch, NewEvent, NewUser, Registration, RegistrationId,
    RegistrationOutcome, User, UserId, UserRole,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// `PostgreSQL`-backed implementation of all three store traits.
#[derive(Clone)]
pub struct PostgresStore {
    /// Connection pool shared across handlers.
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Escape LIKE metacharacters so a search term is matched literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            // The role column carries a CHECK constraint, so parse can only
            // miss if the schema drifted; degrade to the unprivileged role.
            role: UserRole::parse(&row.role).unwrap_or(UserRole::User),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: String,
    location: String,
    date: NaiveDate,
    event_time: String,
    price: String,
    image_url: Option<String>,
    attendees: i32,
    organizer: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId(row.id),
            name: row.name,
            description: row.description,
            location: row.location,
            date: row.date,
            time: row.event_time,
            price: row.price,
            image_url: row.image_url,
            attendees: row.attendees,
            organizer: row.organizer,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: Uuid,
    event_id: Uuid,
    user_email: String,
    created_at: DateTime<Utc>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            id: RegistrationId(row.id),
            event_id: EventId(row.event_id),
            user_email: row.user_email,
            created_at: row.created_at,
        }
    }
}

const EVENT_COLUMNS: &str = "id, name, description, location, date, event_time, price, \
     image_url, attendees, organizer, created_at, updated_at";

// ============================================================================
// UserStore
// ============================================================================

#[async_trait]
impl UserStore for PostgresStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let id = UserId::new();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(id.0)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(new_user.role.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StoreError::DuplicateEmail;
                }
            }
            db_err(e)
        })?;

        Ok(User {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, password_hash, name, role, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, password_hash, name, role, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(User::from))
    }

    async fn update_user_name(&self, user_id: UserId, name: &str) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET name = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, name, role, created_at, updated_at
            ",
        )
        .bind(user_id.0)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(StoreError::NotFound("User"))?;

        Ok(row.into())
    }
}

// ============================================================================
// EventStore
// ============================================================================

#[async_trait]
impl EventStore for PostgresStore {
    async fn list_events(&self, search: Option<&str>) -> Result<Vec<Event>> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' ESCAPE '\\') \
             ORDER BY date DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, EventRow>(&query)
            .bind(search.map(escape_like))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, EventRow>(&query)
            .bind(event_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Event::from))
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let id = EventId::new();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO events
                (id, name, description, location, date, event_time, price,
                 image_url, attendees, organizer, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ",
        )
        .bind(id.0)
        .bind(&new_event.name)
        .bind(&new_event.description)
        .bind(&new_event.location)
        .bind(new_event.date)
        .bind(&new_event.time)
        .bind(&new_event.price)
        .bind(&new_event.image_url)
        .bind(new_event.attendees)
        .bind(&new_event.organizer)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Event {
            id,
            name: new_event.name,
            description: new_event.description,
            location: new_event.location,
            date: new_event.date,
            time: new_event.time,
            price: new_event.price,
            image_url: new_event.image_url,
            attendees: new_event.attendees,
            organizer: new_event.organizer,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_event(&self, event_id: EventId, patch: EventPatch) -> Result<Event> {
        // Read-modify-write under a row lock: the patch is tri-state for
        // image_url, which a plain COALESCE update cannot express.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, EventRow>(&query)
            .bind(event_id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(StoreError::NotFound("Event"))?;

        let mut event = Event::from(row);
        if let Some(name) = patch.name {
            event.name = name;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        if let Some(location) = patch.location {
            event.location = location;
        }
        if let Some(date) = patch.date {
            event.date = date;
        }
        if let Some(time) = patch.time {
            event.time = time;
        }
        if let Some(price) = patch.price {
            event.price = price;
        }
        if let Some(image_url) = patch.image_url {
            event.image_url = image_url;
        }
        if let Some(attendees) = patch.attendees {
            event.attendees = attendees;
        }
        if let Some(organizer) = patch.organizer {
            event.organizer = organizer;
        }
        event.updated_at = Utc::now();

        sqlx::query(
            r"
            UPDATE events
            SET name = $2,
                description = $3,
                location = $4,
                date = $5,
                event_time = $6,
                price = $7,
                image_url = $8,
                attendees = $9,
                organizer = $10,
                updated_at = $11
            WHERE id = $1
            ",
        )
        .bind(event_id.0)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.price)
        .bind(&event.image_url)
        .bind(event.attendees)
        .bind(&event.organizer)
        .bind(event.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(event)
    }

    async fn delete_event(&self, event_id: EventId) -> Result<()> {
        // Registrations cascade via the FK constraint.
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id.0)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Event"));
        }

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

// ============================================================================
// RegistrationStore
// ============================================================================

#[async_trait]
impl RegistrationStore for PostgresStore {
    async fn register(
        &self,
        event_id: EventId,
        user_email: &str,
    ) -> Result<RegistrationOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // The whole reserve-one-seat contract in a single conditional update:
        // concurrent callers serialize on the row lock, the guard keeps the
        // counter non-negative, and zero rows affected means either "gone" or
        // "sold out" (disambiguated below, inside the same transaction).
        let seats_remaining = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE events
            SET attendees = attendees - 1,
                updated_at = NOW()
            WHERE id = $1 AND attendees > 0
            RETURNING attendees
            ",
        )
        .bind(event_id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(seats_remaining) = seats_remaining else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)",
            )
            .bind(event_id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

            return Err(if exists {
                StoreError::SoldOut
            } else {
                StoreError::NotFound("Event")
            });
        };

        let registration = Registration {
            id: RegistrationId::new(),
            event_id,
            user_email: user_email.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO registrations (id, event_id, user_email, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(registration.id.0)
        .bind(registration.event_id.0)
        .bind(&registration.user_email)
        .bind(registration.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // Aborting here rolls the decrement back with the transaction,
            // so a duplicate attempt does not consume a seat.
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StoreError::AlreadyRegistered;
                }
            }
            db_err(e)
        })?;

        tx.commit().await.map_err(db_err)?;

        Ok(RegistrationOutcome {
            registration,
            seats_remaining,
        })
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r"
            SELECT id, event_id, user_email, created_at
            FROM registrations
            WHERE id = $1
            ",
        )
        .bind(registration_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Registration::from))
    }

    async fn list_registrations_for_email(&self, email: &str) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r"
            SELECT id, event_id, user_email, created_at
            FROM registrations
            WHERE user_email = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Registration::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_terms_match_like_metacharacters_literally() {
        assert_eq!(escape_like("50% off"), "50\\% off");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
