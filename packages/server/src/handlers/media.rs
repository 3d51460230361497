use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use common::storage::identifier_from_url;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Serve a blob by its public path (`v{version}/{folder}/{name}.{ext}`).
///
/// Only meaningful for the filesystem and memory backends, whose public base
/// URL points back at this server.
#[instrument(skip(state))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let identifier = identifier_from_url(&format!("http://media.local/{path}"))
        .ok_or_else(|| AppError::NotFound("Media not found".into()))?;

    let content = state
        .media
        .fetch(&identifier)
        .await
        .map_err(|e| match e {
            common::storage::StorageError::InvalidPath(_) => {
                AppError::NotFound("Media not found".into())
            }
            other => AppError::Internal(format!("Media read failed: {other}")),
        })?
        .ok_or_else(|| AppError::NotFound("Media not found".into()))?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
