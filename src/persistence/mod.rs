//! Persistence layer: PostgreSQL capacity ledger.
//!
//! Provides [`postgres::PostgresLedger`], a [`crate::ledger::CapacityLedger`]
//! backed by `sqlx::PgPool` with SERIALIZABLE transactions, plus the row
//! models it maps to and from.

pub mod models;
pub mod postgres;

pub use postgres::PostgresLedger;
