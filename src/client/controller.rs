//! Optimistic registration controller.
//!
//! [`OptimisticController`] shows the effect of a registration immediately
//! (a speculative decrement of the available spots) and then reconciles
//! with the authoritative answer: confirm on success, roll back on any
//! failure. One attempt may be in flight per controller.
//!
//! ```text
//! Idle ──request──▶ Speculating ──ok──▶ Confirmed   (terminal)
//!   ▲                    │
//!   │                    └──err──▶ RolledBack ──request──▶ Speculating
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::transport::RegistrationTransport;
use crate::domain::{Availability, EventId, RegistrationError, RegistrationReceipt, UserId};

/// State of the current registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    /// No attempt made yet.
    Idle,
    /// Speculative decrement applied, server call in flight.
    Speculating,
    /// Server confirmed the registration.
    Confirmed,
    /// Server rejected the attempt or could not be reached; speculative
    /// delta discarded.
    RolledBack,
}

/// Snapshot of everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerView {
    /// Last confirmed available spots.
    pub authoritative_available: u32,
    /// Displayed available spots, including an unconfirmed decrement.
    pub speculative_available: u32,
    /// Current attempt state.
    pub registration_state: RegistrationState,
    /// Whether the event accepts registrations.
    pub accepting: bool,
    /// Why the last attempt was rolled back.
    pub last_failure: Option<RegistrationError>,
}

impl ControllerView {
    fn initial(availability: Availability) -> Self {
        Self {
            authoritative_available: availability.available,
            speculative_available: availability.available,
            registration_state: RegistrationState::Idle,
            accepting: availability.accepting,
            last_failure: None,
        }
    }

    /// Reason a new request would be turned away, if any.
    fn check_request(&self) -> Result<(), RequestRejected> {
        match self.registration_state {
            RegistrationState::Confirmed => Err(RequestRejected::AlreadyConfirmed),
            RegistrationState::Speculating => Err(RequestRejected::InFlight),
            RegistrationState::Idle | RegistrationState::RolledBack if !self.accepting => {
                Err(RequestRejected::NotAccepting)
            }
            RegistrationState::Idle | RegistrationState::RolledBack
                if self.speculative_available == 0 =>
            {
                Err(RequestRejected::NoSpotsAvailable)
            }
            RegistrationState::Idle | RegistrationState::RolledBack => Ok(()),
        }
    }

    /// Returns `true` if the register affordance should be enabled.
    #[must_use]
    pub fn can_request(&self) -> bool {
        self.check_request().is_ok()
    }

    /// User-facing message for the last rollback.
    #[must_use]
    pub fn failure_message(&self) -> Option<&'static str> {
        self.last_failure.as_ref().map(RegistrationError::user_message)
    }
}

/// Why [`OptimisticController::request_registration`] did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RequestRejected {
    /// Another attempt has not resolved yet.
    #[error("a registration attempt is already in flight")]
    InFlight,
    /// The user is already registered through this controller.
    #[error("registration already confirmed")]
    AlreadyConfirmed,
    /// The event is not published.
    #[error("event is not accepting registrations")]
    NotAccepting,
    /// No spots left to take.
    #[error("no spots available")]
    NoSpotsAvailable,
}

/// Final result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The server committed the registration.
    Confirmed(RegistrationReceipt),
    /// The speculative decrement was discarded.
    RolledBack(RegistrationError),
}

/// Client-side holder of speculative and authoritative availability for one
/// user and one event.
#[derive(Debug)]
pub struct OptimisticController<T> {
    event_id: EventId,
    user_id: UserId,
    transport: Arc<T>,
    timeout: Duration,
    state: Arc<watch::Sender<ControllerView>>,
}

impl<T> OptimisticController<T>
where
    T: RegistrationTransport + 'static,
{
    /// Creates a controller seeded with the last known availability.
    ///
    /// `timeout` bounds each server call; expiry rolls the attempt back as
    /// a [`RegistrationError::TransportFailure`].
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        user_id: UserId,
        availability: Availability,
        timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ControllerView::initial(availability));
        Self {
            event_id: availability.event_id,
            user_id,
            transport,
            timeout,
            state: Arc::new(state),
        }
    }

    /// Event this controller registers for.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Current snapshot.
    #[must_use]
    pub fn view(&self) -> ControllerView {
        self.state.borrow().clone()
    }

    /// Displayed available spots.
    #[must_use]
    pub fn speculative_available(&self) -> u32 {
        self.state.borrow().speculative_available
    }

    /// Current attempt state.
    #[must_use]
    pub fn registration_state(&self) -> RegistrationState {
        self.state.borrow().registration_state
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ControllerView> {
        self.state.subscribe()
    }

    /// Applies availability pushed by the server (e.g. from the WebSocket
    /// feed).
    ///
    /// Ignored while an attempt is in flight, since the pending result will
    /// settle the count itself. Returns `true` if the view changed.
    pub fn apply_availability(&self, available: u32, accepting: bool) -> bool {
        self.state.send_if_modified(|view| {
            if view.registration_state == RegistrationState::Speculating {
                return false;
            }
            let changed =
                view.authoritative_available != available || view.accepting != accepting;
            view.authoritative_available = available;
            view.speculative_available = available;
            view.accepting = accepting;
            changed
        })
    }

    /// Starts a registration attempt.
    ///
    /// The speculative decrement is visible through [`Self::view`] before
    /// this returns; the server call runs on a spawned Tokio task, so this
    /// must be called from within a Tokio runtime. Await
    /// [`PendingRegistration::outcome`] to observe the result, or watch
    /// [`Self::subscribe`].
    ///
    /// # Errors
    ///
    /// Returns a [`RequestRejected`] without touching any state when an
    /// attempt is pending, the registration is already confirmed, the event
    /// is not accepting, or no spots are shown as available.
    pub fn request_registration(&self) -> Result<PendingRegistration, RequestRejected> {
        let mut rejection = None;
        self.state.send_if_modified(|view| {
            if let Err(reason) = view.check_request() {
                rejection = Some(reason);
                return false;
            }
            view.speculative_available = view.authoritative_available.saturating_sub(1);
            view.registration_state = RegistrationState::Speculating;
            view.last_failure = None;
            true
        });
        if let Some(reason) = rejection {
            tracing::debug!(event_id = %self.event_id, %reason, "registration request ignored");
            return Err(reason);
        }

        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let event_id = self.event_id;
        let user_id = self.user_id.clone();
        let timeout = self.timeout;

        let handle = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, transport.register(event_id, &user_id))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(RegistrationError::TransportFailure(format!(
                    "no response within {timeout:?}"
                ))),
            };
            settle(&state, event_id, result)
        });

        Ok(PendingRegistration {
            event_id,
            handle,
            state: Arc::clone(&self.state),
        })
    }
}

/// Handle to an in-flight attempt.
#[derive(Debug)]
pub struct PendingRegistration {
    event_id: EventId,
    handle: JoinHandle<AttemptOutcome>,
    state: Arc<watch::Sender<ControllerView>>,
}

impl PendingRegistration {
    /// Waits for the attempt to settle.
    ///
    /// If the background task died before settling, the attempt is rolled
    /// back here as a transport failure.
    pub async fn outcome(self) -> AttemptOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => settle(
                &self.state,
                self.event_id,
                Err(RegistrationError::TransportFailure(format!(
                    "registration task failed: {join_err}"
                ))),
            ),
        }
    }
}

/// Reconciles the speculative state with the authoritative result.
fn settle(
    state: &watch::Sender<ControllerView>,
    event_id: EventId,
    result: Result<RegistrationReceipt, RegistrationError>,
) -> AttemptOutcome {
    match result {
        Ok(receipt) => {
            state.send_modify(|view| {
                view.authoritative_available = view.authoritative_available.saturating_sub(1);
                view.speculative_available = view.authoritative_available;
                view.registration_state = RegistrationState::Confirmed;
                view.last_failure = None;
            });
            tracing::info!(%event_id, "registration confirmed by server");
            AttemptOutcome::Confirmed(receipt)
        }
        Err(err) => {
            state.send_modify(|view| {
                view.speculative_available = view.authoritative_available;
                view.registration_state = RegistrationState::RolledBack;
                view.last_failure = Some(err.clone());
            });
            tracing::warn!(%event_id, reason = err.code(), error = %err, "registration rolled back");
            AttemptOutcome::RolledBack(err)
        }
    }
}
