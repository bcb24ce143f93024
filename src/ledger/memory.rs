//! In-process capacity ledger with per-event optimistic concurrency.
//!
//! [`InMemoryLedger`] stores every event in its own slot protected by a
//! [`tokio::sync::RwLock`]. A registration transaction reads the slot under
//! a shared lock, evaluates the admission rules with no lock held, then
//! re-acquires the slot exclusively and commits only if the slot version is
//! unchanged. A version mismatch is reported as [`LedgerError::Conflict`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CapacityLedger, LedgerError};
use crate::domain::registration::admit;
use crate::domain::{
    Event, EventId, EventStatus, Registration, RegistrationError, RegistrationReceipt, UserId,
};

/// One event with its markers and a commit counter.
#[derive(Debug)]
struct EventSlot {
    event: Event,
    /// Bumped on every committed mutation of this slot.
    version: u64,
    markers: HashMap<UserId, Registration>,
}

/// Ledger kept entirely in process memory.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-event
/// `Arc<RwLock<EventSlot>>` so transactions on different events never
/// contend.
///
/// # Concurrency
///
/// - Reads of the same event run concurrently.
/// - Commits on the same event are serialized and validated against the
///   version observed at read time.
/// - No lock is held between the read and the commit of an attempt.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    slots: RwLock<HashMap<EventId, Arc<RwLock<EventSlot>>>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored events.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Returns `true` if no event is stored.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    async fn slot(&self, event_id: EventId) -> Option<Arc<RwLock<EventSlot>>> {
        self.slots.read().await.get(&event_id).map(Arc::clone)
    }
}

#[async_trait]
impl CapacityLedger for InMemoryLedger {
    async fn insert_event(&self, event: Event) -> Result<Event, LedgerError> {
        let mut map = self.slots.write().await;
        if map.contains_key(&event.id) {
            return Err(LedgerError::Duplicate(event.id));
        }
        map.insert(
            event.id,
            Arc::new(RwLock::new(EventSlot {
                event: event.clone(),
                version: 0,
                markers: HashMap::new(),
            })),
        );
        Ok(event)
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, LedgerError> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };
        let event = slot.read().await.event.clone();
        Ok(Some(event))
    }

    async fn list_events(&self, status: Option<EventStatus>) -> Result<Vec<Event>, LedgerError> {
        let slots: Vec<_> = self.slots.read().await.values().map(Arc::clone).collect();
        let mut events = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.read().await;
            if let Some(filter) = status
                && slot.event.status != filter
            {
                continue;
            }
            events.push(slot.event.clone());
        }
        events.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(events)
    }

    async fn list_registrations(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Registration>, LedgerError> {
        let slot = self
            .slot(event_id)
            .await
            .ok_or(LedgerError::NotFound(event_id))?;
        let slot = slot.read().await;
        let mut markers: Vec<Registration> = slot.markers.values().cloned().collect();
        markers.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(markers)
    }

    async fn try_register(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> Result<RegistrationReceipt, LedgerError> {
        let slot = self
            .slot(event_id)
            .await
            .ok_or(RegistrationError::NotFound(event_id))?;

        let (snapshot, read_version, already_registered) = {
            let slot = slot.read().await;
            (
                slot.event.clone(),
                slot.version,
                slot.markers.contains_key(user_id),
            )
        };

        admit(event_id, user_id, Some(&snapshot), already_registered)?;

        // Read and commit are separate steps; let concurrent attempts run
        // in between as they would against a remote store.
        tokio::task::yield_now().await;

        let mut slot = slot.write().await;
        if slot.version != read_version {
            return Err(LedgerError::Conflict);
        }

        let registration = Registration::new(event_id, user_id.clone());
        slot.markers.insert(user_id.clone(), registration.clone());
        slot.event.registered_count = slot.event.registered_count.saturating_add(1);
        slot.event.updated_at = registration.registered_at;
        slot.version = slot.version.wrapping_add(1);

        Ok(RegistrationReceipt {
            event: slot.event.clone(),
            registration,
        })
    }

    async fn transition_status(
        &self,
        event_id: EventId,
        next: EventStatus,
    ) -> Result<(EventStatus, Event), LedgerError> {
        let slot = self
            .slot(event_id)
            .await
            .ok_or(LedgerError::NotFound(event_id))?;
        let mut slot = slot.write().await;

        let from = slot.event.status;
        if !from.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                event_id,
                from,
                to: next,
            });
        }

        slot.event.status = next;
        slot.event.updated_at = chrono::Utc::now();
        slot.version = slot.version.wrapping_add(1);
        Ok((from, slot.event.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::NewEvent;
    use proptest::prelude::*;

    fn user(name: &str) -> UserId {
        let Some(id) = UserId::parse(name) else {
            panic!("valid user id");
        };
        id
    }

    fn published(capacity: u32) -> Event {
        let Ok(event) = Event::new(
            user("organizer"),
            NewEvent {
                title: "Conference".to_string(),
                capacity,
                publish: true,
                ..NewEvent::default()
            },
        ) else {
            panic!("valid event");
        };
        event
    }

    async fn seeded(capacity: u32) -> (InMemoryLedger, EventId) {
        let ledger = InMemoryLedger::new();
        let Ok(event) = ledger.insert_event(published(capacity)).await else {
            panic!("insert failed");
        };
        (ledger, event.id)
    }

    #[tokio::test]
    async fn insert_and_get() {
        let (ledger, id) = seeded(5).await;
        let Ok(Some(event)) = ledger.get_event(id).await else {
            panic!("event missing");
        };
        assert_eq!(event.capacity, 5);
        assert_eq!(ledger.len().await, 1);
        assert!(!ledger.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let ledger = InMemoryLedger::new();
        let event = published(1);
        let _ = ledger.insert_event(event.clone()).await;
        assert!(matches!(
            ledger.insert_event(event).await,
            Err(LedgerError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn register_creates_marker_and_increments() {
        let (ledger, id) = seeded(2).await;
        let Ok(receipt) = ledger.try_register(id, &user("alice")).await else {
            panic!("registration failed");
        };
        assert_eq!(receipt.event.registered_count, 1);
        assert_eq!(receipt.registration.user_id, user("alice"));

        let Ok(markers) = ledger.list_registrations(id).await else {
            panic!("list failed");
        };
        assert_eq!(markers.len(), 1);
    }

    #[tokio::test]
    async fn unknown_event_is_rejected_not_found() {
        let ledger = InMemoryLedger::new();
        let id = EventId::new();
        assert!(matches!(
            ledger.try_register(id, &user("alice")).await,
            Err(LedgerError::Rejected(RegistrationError::NotFound(e))) if e == id
        ));
    }

    #[tokio::test]
    async fn stale_read_version_conflicts() {
        let (ledger, id) = seeded(10).await;
        let bob = user("bob");

        // First poll performs the read and parks before the commit.
        let mut attempt = tokio_test::task::spawn(ledger.try_register(id, &bob));
        tokio_test::assert_pending!(attempt.poll());

        let Ok(_) = ledger.try_register(id, &user("alice")).await else {
            panic!("competing registration failed");
        };

        let result = tokio_test::assert_ready!(attempt.poll());
        assert!(matches!(result, Err(LedgerError::Conflict)));

        let Ok(Some(event)) = ledger.get_event(id).await else {
            panic!("event missing");
        };
        assert_eq!(event.registered_count, 1);
    }

    #[tokio::test]
    async fn transition_bumps_status_and_rejects_invalid() {
        let ledger = InMemoryLedger::new();
        let Ok(draft) = Event::new(
            user("organizer"),
            NewEvent {
                title: "Draft".to_string(),
                capacity: 3,
                ..NewEvent::default()
            },
        ) else {
            panic!("valid event");
        };
        let id = draft.id;
        let _ = ledger.insert_event(draft).await;

        let Ok((from, event)) = ledger.transition_status(id, EventStatus::Published).await else {
            panic!("publish failed");
        };
        assert_eq!(from, EventStatus::Draft);
        assert_eq!(event.status, EventStatus::Published);

        assert!(matches!(
            ledger.transition_status(id, EventStatus::Draft).await,
            Err(LedgerError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn list_events_filters_by_status() {
        let ledger = InMemoryLedger::new();
        let _ = ledger.insert_event(published(1)).await;
        let _ = ledger.insert_event(published(2)).await;

        let Ok(all) = ledger.list_events(None).await else {
            panic!("list failed");
        };
        assert_eq!(all.len(), 2);

        let Ok(drafts) = ledger.list_events(Some(EventStatus::Draft)).await else {
            panic!("list failed");
        };
        assert!(drafts.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_attempts_never_overshoot() {
        let (ledger, id) = seeded(3).await;
        let ledger = Arc::new(ledger);

        let mut handles = Vec::new();
        for i in 0..16 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.try_register(id, &user(&format!("user-{i}"))).await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("task panicked");
            };
            match result {
                Ok(_) => committed += 1,
                Err(LedgerError::Conflict | LedgerError::Rejected(RegistrationError::EventFull(_))) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let Ok(Some(event)) = ledger.get_event(id).await else {
            panic!("event missing");
        };
        assert!(committed <= 3);
        assert_eq!(event.registered_count, committed);
        let Ok(markers) = ledger.list_registrations(id).await else {
            panic!("list failed");
        };
        assert_eq!(markers.len() as u32, event.registered_count);
    }

    proptest! {
        #[test]
        fn sequential_registrations_respect_capacity(
            capacity in 1u32..8,
            users in proptest::collection::vec(0u8..12, 0..40),
        ) {
            let Ok(rt) = tokio::runtime::Builder::new_current_thread().build() else {
                panic!("runtime");
            };
            rt.block_on(async {
                let (ledger, id) = seeded(capacity).await;
                let mut seen = std::collections::HashSet::new();
                for u in users {
                    let uid = user(&format!("user-{u}"));
                    let result = ledger.try_register(id, &uid).await;
                    let full = seen.len() as u32 >= capacity;
                    match result {
                        Ok(_) => {
                            prop_assert!(seen.insert(u));
                        }
                        Err(LedgerError::Rejected(RegistrationError::AlreadyRegistered { .. })) => {
                            prop_assert!(seen.contains(&u));
                        }
                        Err(LedgerError::Rejected(RegistrationError::EventFull(_))) => {
                            prop_assert!(full && !seen.contains(&u));
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {}", other),
                    }
                }
                let Ok(Some(event)) = ledger.get_event(id).await else {
                    panic!("event missing");
                };
                prop_assert!(event.registered_count <= capacity);
                prop_assert_eq!(event.registered_count as usize, seen.len());
                Ok(())
            })?;
        }
    }
}
