//! Registration markers, the admission rules, and the registration error
//! taxonomy shared by the server and client halves of the protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Event, EventId, UserId};

/// Durable proof that `user_id` holds a spot at `event_id`.
///
/// Created in the same transaction as the `registered_count` increment.
/// Never updated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Registration {
    /// Event the spot belongs to.
    pub event_id: EventId,
    /// Registered principal.
    pub user_id: UserId,
    /// Commit timestamp.
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// Creates a marker stamped with the current time.
    #[must_use]
    pub fn new(event_id: EventId, user_id: UserId) -> Self {
        Self {
            event_id,
            user_id,
            registered_at: Utc::now(),
        }
    }
}

/// Result of a committed registration: the event as it stands after the
/// increment, plus the marker that was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegistrationReceipt {
    /// Event state right after the commit.
    pub event: Event,
    /// Newly created marker.
    pub registration: Registration,
}

/// Why a registration attempt did not succeed.
///
/// Business-rule rejections (`NotFound`, `AlreadyRegistered`, `EventFull`,
/// `EventNotPublished`) are final. `Contention` and `TransportFailure` form
/// the "retry later" class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The event does not exist.
    #[error("event not found: {0}")]
    NotFound(EventId),

    /// A marker for this user and event already exists.
    #[error("user {user_id} is already registered for event {event_id}")]
    AlreadyRegistered {
        /// Event identifier.
        event_id: EventId,
        /// Principal that tried to register again.
        user_id: UserId,
    },

    /// Every spot is taken.
    #[error("event {0} is full")]
    EventFull(EventId),

    /// The event is not in the published status.
    #[error("event {0} is not open for registration")]
    EventNotPublished(EventId),

    /// Conflicting writers kept aborting the transaction until the retry
    /// limit was reached.
    #[error("registration contended; retry later")]
    Contention,

    /// The ledger or the network could not be reached, or the call timed out.
    #[error("transport failure: {0}")]
    TransportFailure(String),
}

impl RegistrationError {
    /// Stable wire code used in error bodies and client mapping.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::EventFull(_) => "event_full",
            Self::EventNotPublished(_) => "event_not_published",
            Self::Contention => "contention",
            Self::TransportFailure(_) => "transport_failure",
        }
    }

    /// Rebuilds a typed error from its wire code.
    ///
    /// Unknown codes become [`RegistrationError::TransportFailure`] carrying
    /// `message`, since the client cannot tell what the server meant.
    #[must_use]
    pub fn from_code(code: &str, event_id: EventId, user_id: &UserId, message: &str) -> Self {
        match code {
            "not_found" => Self::NotFound(event_id),
            "already_registered" => Self::AlreadyRegistered {
                event_id,
                user_id: user_id.clone(),
            },
            "event_full" => Self::EventFull(event_id),
            "event_not_published" => Self::EventNotPublished(event_id),
            "contention" => Self::Contention,
            _ => Self::TransportFailure(message.to_string()),
        }
    }

    /// Returns `true` for failures that may succeed if tried again later.
    #[must_use]
    pub const fn is_retry_later(&self) -> bool {
        matches!(self, Self::Contention | Self::TransportFailure(_))
    }

    /// Human-readable reason suitable for end users.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "This event no longer exists.",
            Self::AlreadyRegistered { .. } => "You are already registered for this event.",
            Self::EventFull(_) => "Sorry, this event is full.",
            Self::EventNotPublished(_) => "Registration for this event is not open.",
            Self::Contention => {
                "Many people are registering right now. Please try again in a moment."
            }
            Self::TransportFailure(_) => "We could not reach the server. Please try again.",
        }
    }
}

/// Applies the admission rules to a transaction's read set.
///
/// Rules are checked in order: existence, duplicate marker, capacity,
/// status. On success the caller may write the marker and bump the count in
/// the same transaction.
///
/// # Errors
///
/// Returns the first [`RegistrationError`] rule that rejects the attempt.
pub fn admit<'a>(
    event_id: EventId,
    user_id: &UserId,
    event: Option<&'a Event>,
    already_registered: bool,
) -> Result<&'a Event, RegistrationError> {
    let event = event.ok_or(RegistrationError::NotFound(event_id))?;
    if already_registered {
        return Err(RegistrationError::AlreadyRegistered {
            event_id,
            user_id: user_id.clone(),
        });
    }
    if event.is_full() {
        return Err(RegistrationError::EventFull(event_id));
    }
    if !event.status.accepts_registrations() {
        return Err(RegistrationError::EventNotPublished(event_id));
    }
    Ok(event)
}
