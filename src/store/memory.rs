//! In-memory store implementation for tests.
//!
//! Mirrors the semantics of the `PostgreSQL` store, including the atomic
//! reserve-one-seat contract: the write lock held across the whole
//! registration plays the role of the row lock.

use super::{EventStore, RegistrationStore, Result, StoreError, UserStore};
use crate::types::{
    Event, EventId, EventPatch, NewEvent, NewUser, Registration, RegistrationId,
    RegistrationOutcome, User, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    registrations: HashMap<RegistrationId, Registration>,
}

/// In-memory implementation of all three store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn update_user_name(&self, user_id: UserId, name: &str) -> Result<User> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        user.name = name.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_events(&self, search: Option<&str>) -> Result<Vec<Event>> {
        let inner = self.inner.read().await;
        let needle = search.map(str::to_lowercase);
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|e| {
                needle
                    .as_deref()
                    .is_none_or(|n| e.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(events)
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let inner = self.inner.read().await;
        Ok(inner.events.get(&event_id).cloned())
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let event = Event {
            id: EventId::new(),
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
        };
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn update_event(&self, event_id: EventId, patch: EventPatch) -> Result<Event> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .get_mut(&event_id)
            .ok_or(StoreError::NotFound("Event"))?;

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
        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: EventId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.events.remove(&event_id).is_none() {
            return Err(StoreError::NotFound("Event"));
        }
        inner.registrations.retain(|_, r| r.event_id != event_id);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn register(
        &self,
        event_id: EventId,
        user_email: &str,
    ) -> Result<RegistrationOutcome> {
        let mut inner = self.inner.write().await;

        let Some(event) = inner.events.get(&event_id) else {
            return Err(StoreError::NotFound("Event"));
        };
        if event.attendees <= 0 {
            return Err(StoreError::SoldOut);
        }
        // Checked before the decrement so a duplicate never consumes a seat,
        // matching the transactional rollback in the Postgres store.
        if inner
            .registrations
            .values()
            .any(|r| r.event_id == event_id && r.user_email.eq_ignore_ascii_case(user_email))
        {
            return Err(StoreError::AlreadyRegistered);
        }

        let seats_remaining = {
            // Re-borrow mutably now that the checks passed.
            let event = inner
                .events
                .get_mut(&event_id)
                .ok_or(StoreError::NotFound("Event"))?;
            event.attendees -= 1;
            event.updated_at = Utc::now();
            event.attendees
        };

        let registration = Registration {
            id: RegistrationId::new(),
            event_id,
            user_email: user_email.to_string(),
            created_at: Utc::now(),
        };
        inner
            .registrations
            .insert(registration.id, registration.clone());

        Ok(RegistrationOutcome {
            registration,
            seats_remaining,
        })
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<Registration>> {
        let inner = self.inner.read().await;
        Ok(inner.registrations.get(&registration_id).cloned())
    }

    async fn list_registrations_for_email(&self, email: &str) -> Result<Vec<Registration>> {
        let inner = self.inner.read().await;
        let mut registrations: Vec<Registration> = inner
            .registrations
            .values()
            .filter(|r| r.user_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        registrations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(registrations)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::UserRole;
    use chrono::NaiveDate;

    fn demo_event(attendees: i32) -> NewEvent {
        NewEvent {
            name: "Demo".to_string(),
            description: String::new(),
            location: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            time: String::new(),
            price: String::new(),
            image_url: None,
            attendees,
            organizer: String::new(),
        }
    }

    #[tokio::test]
    async fn create_event_persists_one_row() {
        let store = MemoryStore::new();
        let event = store.create_event(demo_event(10)).await.unwrap();
        assert_eq!(event.attendees, 10);

        let events = store.list_events(None).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].attendees, 10);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let store = MemoryStore::new();
        store.create_event(demo_event(5)).await.unwrap();
        let mut other = demo_event(5);
        other.name = "Music Festival".to_string();
        store.create_event(other).await.unwrap();

        let hits = store.list_events(Some("fest")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Music Festival");

        let hits = store.list_events(Some("DEMO")).await.unwrap();
        assert_eq!(hits.len(), 1);

        let hits = store.list_events(Some("nothing")).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_treats_wildcard_characters_literally() {
        let store = MemoryStore::new();
        let mut sale = demo_event(5);
        sale.name = "50% Off Expo".to_string();
        store.create_event(sale).await.unwrap();
        store.create_event(demo_event(5)).await.unwrap();

        // "%" and "_" are plain characters to the search, not wildcards.
        let hits = store.list_events(Some("%")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "50% Off Expo");

        let hits = store.list_events(Some("_")).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn register_decrements_until_sold_out() {
        let store = MemoryStore::new();
        let event = store.create_event(demo_event(1)).await.unwrap();

        let outcome = store.register(event.id, "a@example.com").await.unwrap();
        assert_eq!(outcome.seats_remaining, 0);

        let err = store.register(event.id, "b@example.com").await.unwrap_err();
        assert_eq!(err, StoreError::SoldOut);

        // Never negative.
        let event = store.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.attendees, 0);
    }

    #[tokio::test]
    async fn duplicate_registration_does_not_consume_a_seat() {
        let store = MemoryStore::new();
        let event = store.create_event(demo_event(5)).await.unwrap();

        store.register(event.id, "a@example.com").await.unwrap();
        let err = store.register(event.id, "A@Example.com").await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyRegistered);

        let event = store.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.attendees, 4);
    }

    #[tokio::test]
    async fn register_unknown_event_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .register(EventId::new(), "a@example.com")
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("Event"));
    }

    #[tokio::test]
    async fn duplicate_email_signup_is_rejected() {
        let store = MemoryStore::new();
        let new_user = NewUser {
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "A".to_string(),
            role: UserRole::User,
        };
        store.create_user(new_user.clone()).await.unwrap();

        let mut again = new_user;
        again.email = "A@EXAMPLE.COM".to_string();
        let err = store.create_user(again).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);
    }

    #[tokio::test]
    async fn delete_event_cascades_registrations() {
        let store = MemoryStore::new();
        let event = store.create_event(demo_event(5)).await.unwrap();
        let outcome = store.register(event.id, "a@example.com").await.unwrap();

        store.delete_event(event.id).await.unwrap();
        assert!(store
            .get_registration(outcome.registration.id)
            .await
            .unwrap()
            .is_none());
    }
}
