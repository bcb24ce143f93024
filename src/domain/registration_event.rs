//! Domain events reflecting event-ledger mutations.
//!
//! Every committed change emits a [`RegistrationEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers so
//! clients can refresh their authoritative availability.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, EventStatus, UserId};

/// Domain event emitted after every committed ledger mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RegistrationEvent {
    /// Emitted when a new event is created.
    EventCreated {
        /// Event identifier.
        event_id: EventId,
        /// Display title.
        title: String,
        /// Maximum number of registrations.
        capacity: u32,
        /// Initial status.
        status: EventStatus,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an event is published or closed.
    EventStatusChanged {
        /// Event identifier.
        event_id: EventId,
        /// Status before the change.
        from: EventStatus,
        /// Status after the change.
        to: EventStatus,
        /// Timestamp of the change.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a registration commits.
    RegistrationConfirmed {
        /// Event identifier.
        event_id: EventId,
        /// Registered principal.
        user_id: UserId,
        /// Registered count after the commit.
        registered_count: u32,
        /// Remaining spots after the commit.
        available: u32,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl RegistrationEvent {
    /// Returns the event ID associated with this domain event.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        match self {
            Self::EventCreated { event_id, .. }
            | Self::EventStatusChanged { event_id, .. }
            | Self::RegistrationConfirmed { event_id, .. } => *event_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::EventCreated { .. } => "event_created",
            Self::EventStatusChanged { .. } => "event_status_changed",
            Self::RegistrationConfirmed { .. } => "registration_confirmed",
        }
    }
}
