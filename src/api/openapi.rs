//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{CreateEventRequest, EventListResponse, PaginationMeta, RegistrationListResponse};
use super::handlers::system::HealthResponse;
use crate::domain::{Availability, Event, EventStatus, Registration, RegistrationReceipt};
use crate::error::{ErrorBody, ErrorResponse};

/// Aggregated OpenAPI description, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "registration-gateway",
        description = "Capacity-limited event registration with optimistic clients."
    ),
    paths(
        super::handlers::events::create_event,
        super::handlers::events::list_events,
        super::handlers::events::get_event,
        super::handlers::events::get_availability,
        super::handlers::events::publish_event,
        super::handlers::events::close_event,
        super::handlers::registrations::register,
        super::handlers::registrations::list_registrations,
        super::handlers::system::health_handler,
    ),
    components(schemas(
        Availability,
        CreateEventRequest,
        ErrorBody,
        ErrorResponse,
        Event,
        EventListResponse,
        EventStatus,
        HealthResponse,
        PaginationMeta,
        Registration,
        RegistrationListResponse,
        RegistrationReceipt,
    )),
    tags(
        (name = "Events", description = "Event lifecycle and availability"),
        (name = "Registrations", description = "Atomic spot reservation"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;
