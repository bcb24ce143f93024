//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::RegistrationService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registration service for all business logic.
    pub registration_service: Arc<RegistrationService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wraps a service, sharing its event bus with the WebSocket layer.
    #[must_use]
    pub fn new(registration_service: Arc<RegistrationService>) -> Self {
        let event_bus = registration_service.event_bus().clone();
        Self {
            registration_service,
            event_bus,
        }
    }
}
