//! # registration-gateway
//!
//! REST API and WebSocket gateway for capacity-limited event registration,
//! plus the client-side optimistic controller that talks to it.
//!
//! The server never lets `registered_count` exceed `capacity` or double-book
//! a user, however many requests race for the last spot. Every attempt runs
//! as one transaction against a [`ledger::CapacityLedger`]: read the event
//! and the caller's marker, check the admission rules, then write marker
//! and increment together or not at all. Conflicting transactions are
//! retried a bounded number of times before failing with `Contention`.
//!
//! Clients apply the decrement speculatively through
//! [`client::OptimisticController`] and roll it back if the server says no.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket, OptimisticController)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── RegistrationService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── CapacityLedger (ledger/)
//!     │     ├── InMemoryLedger
//!     │     └── PostgresLedger (persistence/)
//!     │
//!     └── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod service;
pub mod ws;
