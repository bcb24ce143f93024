//! Registration handlers: register the caller, list an event's registrations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::RegistrationListResponse;
use crate::app_state::AppState;
use crate::domain::{EventId, RegistrationReceipt};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /events/{id}/registrations` — Register the caller for an event.
///
/// The spot is taken atomically: either the count is incremented and a
/// marker written, or nothing changes and the typed reason is returned in
/// the error body's `reason` field.
///
/// # Errors
///
/// Returns [`GatewayError::Registration`] with the rejection reason.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/registrations",
    tag = "Registrations",
    summary = "Register for an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("x-user-id" = String, Header, description = "Principal to register"),
    ),
    responses(
        (status = 201, description = "Registration committed", body = RegistrationReceipt),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "Event not found (reason `not_found`)", body = ErrorResponse),
        (status = 409, description = "Rejected: `already_registered`, `event_full` or `event_not_published`", body = ErrorResponse),
        (status = 503, description = "Retry later: `contention` or `transport_failure`", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let receipt = state
        .registration_service
        .register(EventId::from_uuid(id), &user)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `GET /events/{id}/registrations` — List registrations (organizer only).
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-organizers and
/// [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/registrations",
    tag = "Registrations",
    summary = "List registrations",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("x-user-id" = String, Header, description = "Organizer principal"),
    ),
    responses(
        (status = 200, description = "Registration markers", body = RegistrationListResponse),
        (status = 403, description = "Caller is not the organizer", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let event_id = EventId::from_uuid(id);
    let data = state
        .registration_service
        .list_registrations(event_id, &actor)
        .await?;
    Ok(Json(RegistrationListResponse {
        event_id,
        total: data.len(),
        data,
    }))
}

/// Registration routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/events/{id}/registrations",
        post(register).get(list_registrations),
    )
}
