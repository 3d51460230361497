use axum::extract::Multipart;
use axum::extract::multipart::Field;
use common::storage::MediaUpload;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Parsed `multipart/form-data` body of a create or update request.
pub struct ContentForm<T> {
    /// The `payload` JSON part, if sent.
    pub payload: Option<T>,
    pub cover: Option<MediaUpload>,
    /// `gallery` parts in the order they were sent.
    pub gallery: Vec<MediaUpload>,
}

/// Read a content form: one `payload` JSON part, an optional `cover` file
/// and any number of `gallery` files. Unknown parts are ignored.
pub async fn read_content_form<T: DeserializeOwned>(
    multipart: &mut Multipart,
    max_file_size: u64,
) -> Result<ContentForm<T>, AppError> {
    let mut form = ContentForm {
        payload: None,
        cover: None,
        gallery: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "payload" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read payload: {e}")))?;
                let payload = serde_json::from_str(&text)
                    .map_err(|e| AppError::Validation(format!("Invalid payload: {e}")))?;
                form.payload = Some(payload);
            }
            "cover" => {
                if form.cover.is_some() {
                    return Err(AppError::Validation("Only one cover image allowed".into()));
                }
                form.cover = read_file(field, max_file_size).await?;
            }
            "gallery" => {
                if let Some(upload) = read_file(field, max_file_size).await? {
                    form.gallery.push(upload);
                }
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(form)
}

/// Buffer one file part. Empty parts without a file name (an untouched file
/// input) read as `None`.
async fn read_file(mut field: Field<'_>, max_size: u64) -> Result<Option<MediaUpload>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() && file_name.is_empty() {
        return Ok(None);
    }
    if bytes.is_empty() {
        return Err(AppError::Validation(format!("File '{file_name}' is empty")));
    }

    Ok(Some(MediaUpload::new(file_name, content_type, bytes)))
}
