//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` streams [`crate::domain::RegistrationEvent`]s for
//! the events a client subscribed to, so optimistic clients can refresh
//! their authoritative availability without polling.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
