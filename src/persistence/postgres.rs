//! PostgreSQL implementation of the capacity ledger.
//!
//! Every mutating operation runs in its own `SERIALIZABLE` transaction.
//! PostgreSQL aborts one of two overlapping read-then-write transactions
//! with SQLSTATE `40001`; that abort (and the unique-key race on the
//! `registrations` primary key) is reported as [`LedgerError::Conflict`] so
//! the service layer retries the attempt from its read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::{EventRow, EventTuple, RegistrationRow};
use crate::config::GatewayConfig;
use crate::domain::registration::admit;
use crate::domain::{Event, EventId, EventStatus, Registration, RegistrationReceipt, UserId};
use crate::ledger::{CapacityLedger, LedgerError};

/// Schema bootstrap applied by [`PostgresLedger::ensure_schema`].
const SCHEMA: &str = include_str!("../../migrations/0001_registration_ledger.sql");

const SELECT_EVENT: &str = "SELECT id, title, description, location, starts_at, organizer_id, \
     capacity, registered_count, status, created_at, updated_at FROM events WHERE id = $1";

const SELECT_EVENTS: &str = "SELECT id, title, description, location, starts_at, organizer_id, \
     capacity, registered_count, status, created_at, updated_at FROM events \
     WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at ASC, id ASC";

const INSERT_EVENT: &str = "INSERT INTO events (id, title, description, location, starts_at, \
     organizer_id, capacity, registered_count, status, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

const INCREMENT_EVENT: &str = "UPDATE events SET registered_count = registered_count + 1, \
     updated_at = $2 WHERE id = $1 RETURNING id, title, description, location, starts_at, \
     organizer_id, capacity, registered_count, status, created_at, updated_at";

const UPDATE_STATUS: &str = "UPDATE events SET status = $2, updated_at = now() WHERE id = $1 \
     RETURNING id, title, description, location, starts_at, organizer_id, capacity, \
     registered_count, status, created_at, updated_at";

/// SQLSTATE codes that mean "another transaction won; try again".
const RETRYABLE_SQLSTATES: [&str; 3] = ["40001", "40P01", "23505"];

/// PostgreSQL-backed ledger using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a ledger over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from the gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] if the database is unreachable.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| LedgerError::Backend(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Creates the `events` and `registrations` tables if missing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), LedgerError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn begin_serializable(&self) -> Result<Transaction<'static, Postgres>, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        Ok(tx)
    }
}

/// Maps a driver error onto the ledger taxonomy.
fn classify(err: sqlx::Error) -> LedgerError {
    let retryable = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| RETRYABLE_SQLSTATES.iter().any(|c| code == *c));
    if retryable {
        LedgerError::Conflict
    } else {
        LedgerError::Backend(err.to_string())
    }
}

fn to_event(row: EventTuple) -> Result<Event, LedgerError> {
    Event::try_from(EventRow::from(row))
}

#[async_trait]
impl CapacityLedger for PostgresLedger {
    async fn insert_event(&self, event: Event) -> Result<Event, LedgerError> {
        let row = EventRow::try_from(&event)?;
        let result = sqlx::query(INSERT_EVENT)
            .bind(row.id)
            .bind(&row.title)
            .bind(&row.description)
            .bind(&row.location)
            .bind(row.starts_at)
            .bind(&row.organizer_id)
            .bind(row.capacity)
            .bind(row.registered_count)
            .bind(&row.status)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(event),
            Err(e) => match classify(e) {
                LedgerError::Conflict => Err(LedgerError::Duplicate(event.id)),
                other => Err(other),
            },
        }
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, LedgerError> {
        sqlx::query_as::<_, EventTuple>(SELECT_EVENT)
            .bind(*event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .map(to_event)
            .transpose()
    }

    async fn list_events(&self, status: Option<EventStatus>) -> Result<Vec<Event>, LedgerError> {
        sqlx::query_as::<_, EventTuple>(SELECT_EVENTS)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?
            .into_iter()
            .map(to_event)
            .collect()
    }

    async fn list_registrations(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Registration>, LedgerError> {
        let uuid = *event_id.as_uuid();
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
            .bind(uuid)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        if !exists {
            return Err(LedgerError::NotFound(event_id));
        }

        sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "SELECT event_id, user_id, registered_at FROM registrations \
             WHERE event_id = $1 ORDER BY registered_at ASC, user_id ASC",
        )
        .bind(uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?
        .into_iter()
        .map(|(event_id, user_id, registered_at)| {
            Registration::try_from(RegistrationRow {
                event_id,
                user_id,
                registered_at,
            })
        })
        .collect()
    }

    async fn try_register(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> Result<RegistrationReceipt, LedgerError> {
        let uuid = *event_id.as_uuid();
        let mut tx = self.begin_serializable().await?;

        let event = sqlx::query_as::<_, EventTuple>(SELECT_EVENT)
            .bind(uuid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(classify)?
            .map(to_event)
            .transpose()?;

        let already_registered: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(uuid)
        .bind(user_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        // Dropping `tx` on rejection rolls the transaction back.
        admit(event_id, user_id, event.as_ref(), already_registered)?;

        let registered_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO registrations (event_id, user_id) VALUES ($1, $2) RETURNING registered_at",
        )
        .bind(uuid)
        .bind(user_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        let updated = sqlx::query_as::<_, EventTuple>(INCREMENT_EVENT)
            .bind(uuid)
            .bind(registered_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;
        let event = to_event(updated)?;

        tx.commit().await.map_err(classify)?;

        Ok(RegistrationReceipt {
            event,
            registration: Registration {
                event_id,
                user_id: user_id.clone(),
                registered_at,
            },
        })
    }

    async fn transition_status(
        &self,
        event_id: EventId,
        next: EventStatus,
    ) -> Result<(EventStatus, Event), LedgerError> {
        let uuid = *event_id.as_uuid();
        let mut tx = self.begin_serializable().await?;

        let current = sqlx::query_as::<_, EventTuple>(SELECT_EVENT)
            .bind(uuid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(classify)?
            .map(to_event)
            .transpose()?
            .ok_or(LedgerError::NotFound(event_id))?;

        let from = current.status;
        if !from.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                event_id,
                from,
                to: next,
            });
        }

        let updated = sqlx::query_as::<_, EventTuple>(UPDATE_STATUS)
            .bind(uuid)
            .bind(next.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;
        let event = to_event(updated)?;

        tx.commit().await.map_err(classify)?;
        Ok((from, event))
    }
}
