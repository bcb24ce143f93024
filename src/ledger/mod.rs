//! Capacity ledger: the transactional store behind event registration.
//!
//! [`CapacityLedger`] is the seam between the service layer and storage.
//! Implementations must run [`CapacityLedger::try_register`] as one isolated
//! read-then-conditional-write transaction and report a conflicting
//! concurrent writer as [`LedgerError::Conflict`] instead of committing.
//! Retrying is the caller's job.
//!
//! - [`memory::InMemoryLedger`]: versioned per-event slots, optimistic commit.
//! - [`crate::persistence::postgres::PostgresLedger`]: SERIALIZABLE
//!   PostgreSQL transactions.

pub mod memory;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    Event, EventId, EventStatus, Registration, RegistrationError, RegistrationReceipt, UserId,
};

pub use memory::InMemoryLedger;

/// Failures reported by a [`CapacityLedger`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Another writer committed to the same event between this
    /// transaction's read and its write. Safe to retry from scratch.
    #[error("transaction conflict")]
    Conflict,

    /// The admission rules rejected the registration.
    #[error(transparent)]
    Rejected(#[from] RegistrationError),

    /// The event does not exist.
    #[error("event not found: {0}")]
    NotFound(EventId),

    /// An event with the same identifier is already stored.
    #[error("event already exists: {0}")]
    Duplicate(EventId),

    /// The requested status change is not allowed.
    #[error("cannot move event {event_id} from {from} to {to}")]
    InvalidTransition {
        /// Event identifier.
        event_id: EventId,
        /// Current status.
        from: EventStatus,
        /// Requested status.
        to: EventStatus,
    },

    /// Storage backend failure (connection loss, pool timeout, bad row).
    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Authoritative store of events, their counters, and registration markers.
#[async_trait]
pub trait CapacityLedger: Send + Sync + fmt::Debug {
    /// Stores a freshly created event.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Duplicate`] if the ID is taken, or
    /// [`LedgerError::Backend`] on storage failure.
    async fn insert_event(&self, event: Event) -> Result<Event, LedgerError>;

    /// Loads a single event.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Backend`] on storage failure.
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, LedgerError>;

    /// Lists events ordered by creation time, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Backend`] on storage failure.
    async fn list_events(&self, status: Option<EventStatus>) -> Result<Vec<Event>, LedgerError>;

    /// Lists registration markers of an event ordered by commit time.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if the event does not exist, or
    /// [`LedgerError::Backend`] on storage failure.
    async fn list_registrations(&self, event_id: EventId)
    -> Result<Vec<Registration>, LedgerError>;

    /// Runs one registration transaction: read the event and the user's
    /// marker, apply [`crate::domain::registration::admit`], then create the
    /// marker and increment `registered_count` atomically.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] when a business rule fails,
    /// [`LedgerError::Conflict`] when a concurrent writer won the race, or
    /// [`LedgerError::Backend`] on storage failure.
    async fn try_register(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> Result<RegistrationReceipt, LedgerError>;

    /// Moves an event to `next`, returning the previous status and the
    /// updated event. Conflicts with in-flight registration transactions.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`], [`LedgerError::InvalidTransition`],
    /// [`LedgerError::Conflict`], or [`LedgerError::Backend`].
    async fn transition_status(
        &self,
        event_id: EventId,
        next: EventStatus,
    ) -> Result<(EventStatus, Event), LedgerError>;
}
