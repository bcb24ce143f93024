//! Event and registration DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, PaginationParams};
use crate::domain::{Event, EventId, EventStatus, NewEvent, Registration};
use crate::error::GatewayError;

/// Request body for `POST /events`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Display title (1 to 200 characters).
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Venue or meeting link.
    #[serde(default)]
    pub location: String,
    /// Scheduled start.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Maximum number of registrations; must be positive.
    pub capacity: u32,
    /// Publish immediately instead of creating a draft.
    #[serde(default)]
    pub publish: bool,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            location: req.location,
            starts_at: req.starts_at,
            capacity: req.capacity,
            publish: req.publish,
        }
    }
}

/// Query parameters for `GET /events`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEventsQuery {
    /// Only return events in this status (`draft`, `published`, `closed`).
    #[serde(default)]
    pub status: Option<String>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ListEventsQuery {
    /// Parses the optional status filter.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an unknown status name.
    pub fn status_filter(&self) -> Result<Option<EventStatus>, GatewayError> {
        self.status
            .as_deref()
            .map(str::parse::<EventStatus>)
            .transpose()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    /// Pagination settings with defaults applied.
    #[must_use]
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Paginated list response for `GET /events`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventListResponse {
    /// Events on this page.
    pub data: Vec<Event>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `GET /events/{id}/registrations`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationListResponse {
    /// Event the registrations belong to.
    pub event_id: EventId,
    /// Registration markers ordered by commit time.
    pub data: Vec<Registration>,
    /// Number of markers; always equals the event's `registered_count`.
    pub total: usize,
}
