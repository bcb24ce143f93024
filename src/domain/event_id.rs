//! Type-safe event and user identifiers.
//!
//! [`EventId`] is a newtype wrapper around [`uuid::Uuid`] (v4) so that event
//! identifiers cannot be confused with other UUIDs. [`UserId`] wraps the
//! opaque principal identifier handed over by the authentication layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum accepted length of a [`UserId`].
pub const MAX_USER_ID_LEN: usize = 128;

/// Unique identifier for a capacity-bearing event.
///
/// Generated once at event creation time and immutable thereafter. Used as
/// the slot key in the capacity ledger, event discriminator on the
/// [`super::EventBus`], and WebSocket subscription target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EventId(uuid::Uuid);

impl EventId {
    /// Creates a new random `EventId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates an `EventId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for EventId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EventId> for uuid::Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

/// Opaque identifier of an authenticated principal.
///
/// The gateway never interprets the value; it only requires it to be
/// non-empty and at most [`MAX_USER_ID_LEN`] bytes. Deserialization goes
/// through [`UserId::parse`], so the same rules hold for JSON input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Raw value rejected by [`UserId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user id must be 1 to {MAX_USER_ID_LEN} bytes after trimming")]
pub struct InvalidUserId;

impl UserId {
    /// Validates and wraps a raw identifier.
    ///
    /// Surrounding whitespace is trimmed. Returns `None` when the result is
    /// empty or longer than [`MAX_USER_ID_LEN`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_USER_ID_LEN {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidUserId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or(InvalidUserId)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}
