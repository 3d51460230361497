use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::participation::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/participation",
    tag = "Participation",
    operation_id = "joinEvent",
    summary = "Join an event",
    description = "Takes a seat at the event for the caller. The seat limit and the \
        one-entry-per-user rule are checked atomically with the insert.",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 201, description = "Joined", body = ParticipationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Event full or already joined (CAPACITY_EXCEEDED, ALREADY_JOINED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn join_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.participation.join(auth_user.identity(), id).await?;
    Ok((StatusCode::CREATED, Json(ParticipationResponse::from(entry))))
}

#[utoipa::path(
    delete,
    path = "/{id}/participation",
    tag = "Participation",
    operation_id = "leaveEvent",
    summary = "Leave an event",
    description = "Removes the caller's own participation entry.",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Left the event"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not participating (NOT_PARTICIPATING)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn leave_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.participation.leave(auth_user.identity(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/participants",
    tag = "Participation",
    operation_id = "listEventParticipants",
    summary = "List an event's participants",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Participants in join order", body = RosterResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RosterResponse>, AppError> {
    let roster = state.participation.roster(id).await?;
    Ok(Json(roster.into()))
}
