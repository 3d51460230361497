//! Request handling shared by the activity and event endpoints.

use axum::Json;
use axum::extract::Multipart;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::domain::{ContentFields, ContentKind};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::content::*;
use crate::models::shared::Pagination;
use crate::services::{CreateRequest, UpdateRequest};
use crate::state::AppState;
use crate::utils::multipart::read_content_form;

pub(super) async fn create(
    state: &AppState,
    auth_user: &AuthUser,
    kind: ContentKind,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ContentResponse>), AppError> {
    // Reject anonymous callers before buffering any file.
    if auth_user.identity().is_none() {
        return Err(AppError::TokenMissing);
    }

    let form = read_content_form::<CreateContentPayload>(
        &mut multipart,
        state.config.storage.max_blob_size,
    )
    .await?;
    let payload = form
        .payload
        .ok_or_else(|| AppError::Validation("Missing 'payload' field".into()))?;

    let request = CreateRequest {
        fields: ContentFields::from(payload),
        cover: form.cover,
        gallery: form.gallery,
    };
    let saved = state
        .content
        .create(auth_user.identity(), kind, request)
        .await?;

    Ok((StatusCode::CREATED, Json(saved.into())))
}

pub(super) async fn update(
    state: &AppState,
    auth_user: &AuthUser,
    kind: ContentKind,
    id: Uuid,
    mut multipart: Multipart,
) -> Result<Json<ContentResponse>, AppError> {
    if auth_user.identity().is_none() {
        return Err(AppError::TokenMissing);
    }

    let form = read_content_form::<UpdateContentPayload>(
        &mut multipart,
        state.config.storage.max_blob_size,
    )
    .await?;
    let (patch, kept_gallery) = form.payload.unwrap_or_default().into_parts();

    let request = UpdateRequest {
        patch,
        cover: form.cover,
        gallery: form.gallery,
        kept_gallery,
    };
    let saved = state
        .content
        .update(auth_user.identity(), kind, id, request)
        .await?;

    Ok(Json(saved.into()))
}

pub(super) async fn delete(
    state: &AppState,
    auth_user: &AuthUser,
    kind: ContentKind,
    id: Uuid,
) -> Result<Json<DeleteContentResponse>, AppError> {
    let report = state
        .content
        .delete(auth_user.identity(), kind, id)
        .await?;
    Ok(Json(report.into()))
}

pub(super) async fn get(
    state: &AppState,
    kind: ContentKind,
    id: Uuid,
) -> Result<Json<ContentResponse>, AppError> {
    let record = state.content.get(kind, id).await?;
    Ok(Json(record.into()))
}

pub(super) async fn list(
    state: &AppState,
    kind: ContentKind,
    query: ContentListQuery,
) -> Result<Json<ContentListResponse>, AppError> {
    let result = state.content.list(kind, query.into()).await?;

    Ok(Json(ContentListResponse {
        pagination: Pagination::new(result.page, result.per_page, result.total),
        data: result.items.into_iter().map(Into::into).collect(),
    }))
}
