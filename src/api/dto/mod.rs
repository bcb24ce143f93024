//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain records ([`crate::domain::Event`], [`crate::domain::Availability`],
//! [`crate::domain::RegistrationReceipt`]) serialize directly; this module
//! only holds request bodies, query parameters, and list envelopes.

pub mod common_dto;
pub mod event_dto;

pub use common_dto::*;
pub use event_dto::*;
