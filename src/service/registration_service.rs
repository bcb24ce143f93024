//! Registration service: event lifecycle and the retrying registration
//! transaction.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{
    Availability, Event, EventBus, EventId, EventStatus, NewEvent, Registration,
    RegistrationError, RegistrationEvent, RegistrationReceipt, UserId,
};
use crate::error::GatewayError;
use crate::ledger::{CapacityLedger, LedgerError};

/// Bounded retry for transactions aborted by a conflicting writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1).
    pub max_attempts: u32,
    /// Linear backoff unit: attempt `n` waits `n * backoff` before retrying.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            backoff,
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(5))
    }
}

/// Orchestration layer for event and registration operations.
///
/// Owns the [`CapacityLedger`] handle for state and the [`EventBus`] for
/// event emission. It holds no lock of its own: every consistency guarantee
/// comes from the ledger transaction, so any number of service instances
/// may share one ledger.
#[derive(Debug, Clone)]
pub struct RegistrationService {
    ledger: Arc<dyn CapacityLedger>,
    event_bus: EventBus,
    retry: RetryPolicy,
}

impl RegistrationService {
    /// Creates a new `RegistrationService`.
    #[must_use]
    pub fn new(ledger: Arc<dyn CapacityLedger>, event_bus: EventBus, retry: RetryPolicy) -> Self {
        Self {
            ledger,
            event_bus,
            retry,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Creates a new event owned by `organizer`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] on invalid attributes, or a
    /// persistence error from the ledger.
    pub async fn create_event(
        &self,
        organizer: UserId,
        spec: NewEvent,
    ) -> Result<Event, GatewayError> {
        let event = Event::new(organizer, spec)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        let event = self.ledger.insert_event(event).await?;

        let _ = self.event_bus.publish(RegistrationEvent::EventCreated {
            event_id: event.id,
            title: event.title.clone(),
            capacity: event.capacity,
            status: event.status,
            timestamp: Utc::now(),
        });

        tracing::info!(event_id = %event.id, capacity = event.capacity, status = %event.status, "event created");
        Ok(event)
    }

    /// Loads a single event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if it does not exist.
    pub async fn get_event(&self, event_id: EventId) -> Result<Event, GatewayError> {
        self.ledger
            .get_event(event_id)
            .await?
            .ok_or(GatewayError::EventNotFound(event_id.into()))
    }

    /// Returns the authoritative availability of an event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if it does not exist.
    pub async fn availability(&self, event_id: EventId) -> Result<Availability, GatewayError> {
        Ok(self.get_event(event_id).await?.availability())
    }

    /// Lists events ordered by creation time, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns a persistence error from the ledger.
    pub async fn list_events(
        &self,
        status: Option<EventStatus>,
    ) -> Result<Vec<Event>, GatewayError> {
        Ok(self.ledger.list_events(status).await?)
    }

    /// Opens an event for registration.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Forbidden`] unless `actor` is the organizer,
    /// [`GatewayError::InvalidStatusTransition`] unless the event is a draft.
    pub async fn publish_event(
        &self,
        event_id: EventId,
        actor: &UserId,
    ) -> Result<Event, GatewayError> {
        self.transition(event_id, actor, EventStatus::Published).await
    }

    /// Stops accepting registrations.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Forbidden`] unless `actor` is the organizer,
    /// [`GatewayError::InvalidStatusTransition`] if already closed.
    pub async fn close_event(
        &self,
        event_id: EventId,
        actor: &UserId,
    ) -> Result<Event, GatewayError> {
        self.transition(event_id, actor, EventStatus::Closed).await
    }

    /// Lists the registration markers of an event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Forbidden`] unless `actor` is the organizer,
    /// [`GatewayError::EventNotFound`] if the event does not exist.
    pub async fn list_registrations(
        &self,
        event_id: EventId,
        actor: &UserId,
    ) -> Result<Vec<Registration>, GatewayError> {
        self.authorize_organizer(event_id, actor).await?;
        Ok(self.ledger.list_registrations(event_id).await?)
    }

    /// Registers `user_id` for `event_id`.
    ///
    /// Each attempt is one ledger transaction; attempts aborted by a
    /// conflicting writer are retried according to the [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::NotFound`], [`RegistrationError::AlreadyRegistered`],
    ///   [`RegistrationError::EventFull`], [`RegistrationError::EventNotPublished`]
    ///   when a business rule rejects the attempt (never retried).
    /// - [`RegistrationError::Contention`] when every attempt conflicted.
    /// - [`RegistrationError::TransportFailure`] when the ledger is unreachable.
    pub async fn register(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let outcome = self
            .with_retry(event_id, "register", || {
                self.ledger.try_register(event_id, user_id)
            })
            .await;

        let receipt = match outcome {
            Ok(receipt) => receipt,
            Err(LedgerError::Rejected(err)) => {
                tracing::debug!(%event_id, %user_id, reason = err.code(), "registration rejected");
                return Err(err);
            }
            Err(LedgerError::Conflict) => {
                tracing::warn!(
                    %event_id,
                    %user_id,
                    attempts = self.retry.max_attempts,
                    "registration gave up after repeated conflicts"
                );
                return Err(RegistrationError::Contention);
            }
            Err(LedgerError::NotFound(id)) => return Err(RegistrationError::NotFound(id)),
            Err(other) => {
                tracing::error!(%event_id, error = %other, "ledger unavailable during registration");
                return Err(RegistrationError::TransportFailure(other.to_string()));
            }
        };

        let _ = self
            .event_bus
            .publish(RegistrationEvent::RegistrationConfirmed {
                event_id,
                user_id: user_id.clone(),
                registered_count: receipt.event.registered_count,
                available: receipt.event.available(),
                timestamp: receipt.registration.registered_at,
            });

        tracing::info!(
            %event_id,
            %user_id,
            registered = receipt.event.registered_count,
            capacity = receipt.event.capacity,
            "registration confirmed"
        );
        Ok(receipt)
    }

    async fn transition(
        &self,
        event_id: EventId,
        actor: &UserId,
        next: EventStatus,
    ) -> Result<Event, GatewayError> {
        self.authorize_organizer(event_id, actor).await?;

        let (from, event) = self
            .with_retry(event_id, "transition", || {
                self.ledger.transition_status(event_id, next)
            })
            .await?;

        let _ = self.event_bus.publish(RegistrationEvent::EventStatusChanged {
            event_id,
            from,
            to: next,
            timestamp: event.updated_at,
        });

        tracing::info!(%event_id, %from, to = %next, "event status changed");
        Ok(event)
    }

    async fn authorize_organizer(
        &self,
        event_id: EventId,
        actor: &UserId,
    ) -> Result<Event, GatewayError> {
        let event = self.get_event(event_id).await?;
        if &event.organizer_id != actor {
            return Err(GatewayError::Forbidden(format!(
                "only the organizer may manage event {event_id}"
            )));
        }
        Ok(event)
    }

    /// Runs `op` until it stops reporting [`LedgerError::Conflict`] or the
    /// attempt budget is spent. Exhaustion returns the last conflict.
    async fn with_retry<T, F, Fut>(
        &self,
        event_id: EventId,
        op: &'static str,
        mut attempt_once: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_once().await {
                Err(LedgerError::Conflict) if attempt < self.retry.max_attempts => {
                    tracing::debug!(%event_id, op, attempt, "transaction conflict, retrying");
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
