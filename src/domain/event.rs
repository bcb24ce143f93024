//! Capacity-bearing event record and its lifecycle status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, UserId};

/// Maximum length of an event title in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Largest capacity an event may declare. Counters are stored as
/// PostgreSQL `INTEGER`, so every ledger shares this bound.
pub const MAX_CAPACITY: u32 = i32::MAX as u32;

/// Lifecycle status of an event. Only [`EventStatus::Published`] accepts
/// new registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Created but not yet visible for registration.
    Draft,
    /// Open for registration.
    Published,
    /// No longer accepting registrations.
    Closed,
}

impl EventStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` if registrations are accepted in this status.
    #[must_use]
    pub const fn accepts_registrations(&self) -> bool {
        matches!(self, Self::Published)
    }

    /// Returns `true` if an event in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (*self, next),
            (Self::Draft, Self::Published | Self::Closed) | (Self::Published, Self::Closed)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "closed" => Ok(Self::Closed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Validation failures when building a new [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventValidationError {
    /// Title is empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Title exceeds [`MAX_TITLE_LEN`] characters.
    #[error("title must be at most {MAX_TITLE_LEN} characters")]
    TitleTooLong,
    /// Capacity must be a positive integer.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,
    /// Capacity exceeds [`MAX_CAPACITY`].
    #[error("capacity must be at most {MAX_CAPACITY}")]
    CapacityTooLarge,
}

/// Organizer-supplied attributes of an event about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Venue or meeting link.
    pub location: String,
    /// Scheduled start, if known.
    pub starts_at: Option<DateTime<Utc>>,
    /// Maximum number of registrations.
    pub capacity: u32,
    /// Publish immediately instead of starting as a draft.
    pub publish: bool,
}

/// Capacity-bearing event as stored in the ledger.
///
/// `registered_count` is only ever mutated by a committed registration
/// transaction and always stays within `0..=capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Unique identifier (immutable after creation).
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Venue or meeting link.
    pub location: String,
    /// Scheduled start, if known.
    pub starts_at: Option<DateTime<Utc>>,
    /// Principal that created the event.
    pub organizer_id: UserId,
    /// Maximum number of registrations (immutable after creation).
    pub capacity: u32,
    /// Number of committed registrations.
    pub registered_count: u32,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last committed mutation.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Builds a fresh event owned by `organizer_id`.
    ///
    /// # Errors
    ///
    /// Returns an [`EventValidationError`] if the title is empty or too long,
    /// or if the capacity is zero or above [`MAX_CAPACITY`].
    pub fn new(organizer_id: UserId, spec: NewEvent) -> Result<Self, EventValidationError> {
        let title = spec.title.trim().to_string();
        if title.is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(EventValidationError::TitleTooLong);
        }
        if spec.capacity == 0 {
            return Err(EventValidationError::ZeroCapacity);
        }
        if spec.capacity > MAX_CAPACITY {
            return Err(EventValidationError::CapacityTooLarge);
        }

        let now = Utc::now();
        Ok(Self {
            id: EventId::new(),
            title,
            description: spec.description,
            location: spec.location,
            starts_at: spec.starts_at,
            organizer_id,
            capacity: spec.capacity,
            registered_count: 0,
            status: if spec.publish {
                EventStatus::Published
            } else {
                EventStatus::Draft
            },
            created_at: now,
            updated_at: now,
        })
    }

    /// Remaining spots, `capacity - registered_count`.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.registered_count)
    }

    /// Returns `true` once every spot is taken.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.registered_count >= self.capacity
    }

    /// Returns the availability projection consumed by clients.
    #[must_use]
    pub const fn availability(&self) -> Availability {
        Availability {
            event_id: self.id,
            capacity: self.capacity,
            registered_count: self.registered_count,
            available: self.available(),
            accepting: self.status.accepts_registrations(),
        }
    }
}

/// Authoritative availability snapshot for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Availability {
    /// Event identifier.
    pub event_id: EventId,
    /// Maximum number of registrations.
    pub capacity: u32,
    /// Committed registrations.
    pub registered_count: u32,
    /// Remaining spots.
    pub available: u32,
    /// Whether the event currently accepts registrations.
    pub accepting: bool,
}
