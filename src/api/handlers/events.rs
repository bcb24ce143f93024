//! Event lifecycle handlers: create, list, get, availability, publish, close.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::{CreateEventRequest, EventListResponse, ListEventsQuery};
use crate::app_state::AppState;
use crate::domain::{Availability, Event, EventId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /events` — Create an event owned by the caller.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on a malformed body, a blank
/// title, or an out-of-range capacity, and [`GatewayError::Unauthorized`]
/// without a caller identity.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates a capacity-limited event owned by the caller. Events start as drafts unless `publish` is set.",
    request_body = CreateEventRequest,
    params(
        ("x-user-id" = String, Header, description = "Authenticated principal"),
    ),
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid attributes", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthenticatedUser(organizer): AuthenticatedUser,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let event = state
        .registration_service
        .create_event(organizer, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events` — List events with pagination and optional status filter.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an unknown status filter.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns a paginated list of events ordered by creation time, optionally filtered by status.",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Paginated event list", body = EventListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let status = query.status_filter()?;
    let events = state.registration_service.list_events(status).await?;
    let (data, pagination) = query.pagination().paginate(events);
    Ok(Json(EventListResponse { data, pagination }))
}

/// `GET /events/{id}` — Get event details.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event details",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = Event),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let event = state
        .registration_service
        .get_event(EventId::from_uuid(id))
        .await?;
    Ok(Json(event))
}

/// `GET /events/{id}/availability` — Authoritative availability snapshot.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/availability",
    tag = "Events",
    summary = "Get availability",
    description = "Returns committed registrations and remaining spots. Clients seed their optimistic view from this.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Availability snapshot", body = Availability),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let availability = state
        .registration_service
        .availability(EventId::from_uuid(id))
        .await?;
    Ok(Json(availability))
}

/// `POST /events/{id}/publish` — Open a draft event for registration.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-organizers and
/// [`GatewayError::InvalidStatusTransition`] unless the event is a draft.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/publish",
    tag = "Events",
    summary = "Publish an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("x-user-id" = String, Header, description = "Organizer principal"),
    ),
    responses(
        (status = 200, description = "Event published", body = Event),
        (status = 403, description = "Caller is not the organizer", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event is not a draft", body = ErrorResponse),
    )
)]
pub async fn publish_event(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let event = state
        .registration_service
        .publish_event(EventId::from_uuid(id), &actor)
        .await?;
    Ok(Json(event))
}

/// `POST /events/{id}/close` — Stop accepting registrations.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-organizers and
/// [`GatewayError::InvalidStatusTransition`] if already closed.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/close",
    tag = "Events",
    summary = "Close an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("x-user-id" = String, Header, description = "Organizer principal"),
    ),
    responses(
        (status = 200, description = "Event closed", body = Event),
        (status = 403, description = "Caller is not the organizer", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event already closed", body = ErrorResponse),
    )
)]
pub async fn close_event(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let event = state
        .registration_service
        .close_event(EventId::from_uuid(id), &actor)
        .await?;
    Ok(Json(event))
}

/// Event management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/availability", get(get_availability))
        .route("/events/{id}/publish", post(publish_event))
        .route("/events/{id}/close", post(close_event))
}
