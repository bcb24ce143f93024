//! Database row models for events and registration markers.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Event, EventId, EventStatus, Registration, UserId};
use crate::ledger::LedgerError;

/// Column tuple returned by every `SELECT`/`RETURNING` on the `events`
/// table, in `EVENT_COLUMNS` order.
pub type EventTuple = (
    Uuid,
    String,
    String,
    String,
    Option<DateTime<Utc>>,
    String,
    i32,
    i32,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// A row from the `events` table.
#[derive(Debug, Clone)]
pub struct EventRow {
    /// Primary key.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Venue or meeting link.
    pub location: String,
    /// Scheduled start.
    pub starts_at: Option<DateTime<Utc>>,
    /// Creator principal.
    pub organizer_id: String,
    /// Maximum registrations (`CHECK capacity > 0`).
    pub capacity: i32,
    /// Committed registrations.
    pub registered_count: i32,
    /// Status discriminator (`draft`, `published`, `closed`).
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<EventTuple> for EventRow {
    fn from(
        (
            id,
            title,
            description,
            location,
            starts_at,
            organizer_id,
            capacity,
            registered_count,
            status,
            created_at,
            updated_at,
        ): EventTuple,
    ) -> Self {
        Self {
            id,
            title,
            description,
            location,
            starts_at,
            organizer_id,
            capacity,
            registered_count,
            status,
            created_at,
            updated_at,
        }
    }
}

impl TryFrom<&Event> for EventRow {
    type Error = LedgerError;

    fn try_from(event: &Event) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *event.id.as_uuid(),
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            starts_at: event.starts_at,
            organizer_id: event.organizer_id.as_str().to_string(),
            capacity: i32::try_from(event.capacity)
                .map_err(|_| LedgerError::Backend("capacity out of range".to_string()))?,
            registered_count: i32::try_from(event.registered_count)
                .map_err(|_| LedgerError::Backend("registered_count out of range".to_string()))?,
            status: event.status.as_str().to_string(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        })
    }
}

impl TryFrom<EventRow> for Event {
    type Error = LedgerError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |what: &str| LedgerError::Backend(format!("corrupt event row {id}: {what}"));
        let status: EventStatus = row.status.parse().map_err(|_| corrupt("status"))?;
        let organizer_id = UserId::parse(&row.organizer_id).ok_or_else(|| corrupt("organizer_id"))?;
        let capacity = u32::try_from(row.capacity).map_err(|_| corrupt("capacity"))?;
        let registered_count =
            u32::try_from(row.registered_count).map_err(|_| corrupt("registered_count"))?;

        Ok(Self {
            id: EventId::from_uuid(id),
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            organizer_id,
            capacity,
            registered_count,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `registrations` table.
#[derive(Debug, Clone)]
pub struct RegistrationRow {
    /// Event foreign key.
    pub event_id: Uuid,
    /// Registered principal.
    pub user_id: String,
    /// Commit timestamp.
    pub registered_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = LedgerError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(&row.user_id).ok_or_else(|| {
            LedgerError::Backend(format!("corrupt registration row for event {}", row.event_id))
        })?;
        Ok(Self {
            event_id: EventId::from_uuid(row.event_id),
            user_id,
            registered_at: row.registered_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::NewEvent;

    #[test]
    fn event_row_round_trip() {
        let Some(organizer) = UserId::parse("org") else {
            panic!("valid user id");
        };
        let Ok(event) = Event::new(
            organizer,
            NewEvent {
                title: "Hackathon".to_string(),
                capacity: 40,
                publish: true,
                ..NewEvent::default()
            },
        ) else {
            panic!("valid event");
        };
        let Ok(row) = EventRow::try_from(&event) else {
            panic!("row conversion failed");
        };
        assert_eq!(row.status, "published");
        let Ok(back) = Event::try_from(row) else {
            panic!("event conversion failed");
        };
        assert_eq!(back, event);
    }

    #[test]
    fn negative_count_is_corrupt() {
        let now = Utc::now();
        let row = EventRow {
            id: Uuid::new_v4(),
            title: "x".to_string(),
            description: String::new(),
            location: String::new(),
            starts_at: None,
            organizer_id: "org".to_string(),
            capacity: 5,
            registered_count: -1,
            status: "published".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(Event::try_from(row), Err(LedgerError::Backend(_))));
    }
}
