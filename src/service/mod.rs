//! Service layer: business logic orchestration.
//!
//! [`RegistrationService`] manages the event lifecycle, runs registration
//! transactions against the [`crate::ledger::CapacityLedger`] with bounded
//! retry, and emits events through the [`super::domain::EventBus`].

pub mod registration_service;

pub use registration_service::{RegistrationService, RetryPolicy};
