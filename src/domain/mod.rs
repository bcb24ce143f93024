//! Domain layer: identifiers, events, registration rules, and the event bus.
//!
//! Everything here is storage-agnostic. The admission rules in
//! [`registration::admit`] are evaluated inside ledger transactions by every
//! [`crate::ledger::CapacityLedger`] implementation.

pub mod event;
pub mod event_bus;
pub mod event_id;
pub mod registration;
pub mod registration_event;

pub use event::{Availability, Event, EventStatus, EventValidationError, NewEvent};
pub use event_bus::EventBus;
pub use event_id::{EventId, InvalidUserId, UserId};
pub use registration::{Registration, RegistrationError, RegistrationReceipt};
pub use registration_event::RegistrationEvent;
