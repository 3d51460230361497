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
    tag = "Activities",
    operation_id = "createActivity",
    summary = "Create an activity",
    description = "Creates an activity owned by the caller. The body is `multipart/form-data` with a \
        `payload` JSON part, an optional `cover` file and any number of \
        `gallery` files (display order is upload order). \
        Images are uploaded before the record is inserted.",
    request_body(content_type = "multipart/form-data", content = CreateContentPayload, description = "JSON payload plus image files"),
    responses(
        (status = 201, description = "Activity created", body = ContentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Media store rejected an upload (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn create_activity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    content::create(&state, &auth_user, ContentKind::Activity, multipart).await
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Activities",
    operation_id = "listActivities",
    summary = "List activities",
    description = "Returns activities newest first, optionally filtered by owner.",
    params(ContentListQuery),
    responses(
        (status = 200, description = "List of activities", body = ContentListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<ContentListResponse>, AppError> {
    content::list(&state, ContentKind::Activity, query).await
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Activities",
    operation_id = "getActivity",
    summary = "Get an activity by ID",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Activity found", body = ContentResponse),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContentResponse>, AppError> {
    content::get(&state, ContentKind::Activity, id).await
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Activities",
    operation_id = "updateActivity",
    summary = "Update an activity",
    description = "Owner only. Fields absent from `payload` are left unchanged. A new `cover` \
        replaces the old one, which is removed from the media store after the record is \
        updated. `payload.kept_gallery_images` selects \
        which gallery images stay; new `gallery` files are appended after them.",
    params(("id" = Uuid, Path, description = "Activity ID")),
    request_body(content_type = "multipart/form-data", content = UpdateContentPayload, description = "Optional JSON payload plus image files"),
    responses(
        (status = 200, description = "Activity updated", body = ContentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Media store rejected an upload (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn update_activity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ContentResponse>, AppError> {
    content::update(&state, &auth_user, ContentKind::Activity, id, multipart).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Activities",
    operation_id = "deleteActivity",
    summary = "Delete an activity",
    description = "Owner only. The record is deleted first; its images are then removed from \
        the media store. Image removal failures are reported but do not fail the request.",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Activity deleted", body = DeleteContentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_activity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteContentResponse>, AppError> {
    content::delete(&state, &auth_user, ContentKind::Activity, id).await
}
