use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use super::content;
use crate::domain::ContentKind;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::content::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Creates an event owned by the caller. The body is `multipart/form-data` with a \
        `payload` JSON part, an optional `cover` file and no gallery. \
        `payload.capacity` limits participation (0 or omitted is unbounded). \
        Images are uploaded before the record is inserted.",
    request_body(content_type = "multipart/form-data", content = CreateContentPayload, description = "JSON payload plus image files"),
    responses(
        (status = 201, description = "Event created", body = ContentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Media store rejected an upload (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    content::create(&state, &auth_user, ContentKind::Event, multipart).await
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Returns events newest first, optionally filtered by owner.",
    params(ContentListQuery),
    responses(
        (status = 200, description = "List of events", body = ContentListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<ContentListResponse>, AppError> {
    content::list(&state, ContentKind::Event, query).await
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = ContentResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContentResponse>, AppError> {
    content::get(&state, ContentKind::Event, id).await
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Owner only. Fields absent from `payload` are left unchanged. A new `cover` \
        replaces the old one, which is removed from the media store after the record is \
        updated.",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body(content_type = "multipart/form-data", content = UpdateContentPayload, description = "Optional JSON payload plus image files"),
    responses(
        (status = 200, description = "Event updated", body = ContentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Media store rejected an upload (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ContentResponse>, AppError> {
    content::update(&state, &auth_user, ContentKind::Event, id, multipart).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Owner only. The record is deleted first; its images are then removed from \
        the media store. Image removal failures are reported but do not fail the request.",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = DeleteContentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteContentResponse>, AppError> {
    content::delete(&state, &auth_user, ContentKind::Event, id).await
}
