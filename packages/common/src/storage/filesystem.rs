use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;

use super::error::StorageError;
use super::identifier::{media_url, validate_relative_path};
use super::traits::{MediaStore, MediaUpload};

/// Filesystem-backed media store.
///
/// Blobs live at `{base_path}/{folder}/{name}` where `name` is a fresh
/// UUIDv7, so two uploads never share a blob. Public URLs have the form
/// `{public_base_url}/v{unix seconds}/{folder}/{name}.{ext}`.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store.
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
            max_size,
        })
    }

    fn blob_path(&self, identifier: &str) -> PathBuf {
        self.base_path.join(identifier)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn store(&self, upload: &MediaUpload, folder: &str) -> Result<String, StorageError> {
        validate_relative_path(folder)?;
        if upload.len() > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: upload.len(),
                limit: self.max_size,
            });
        }

        let identifier = format!("{folder}/{}", uuid::Uuid::now_v7().simple());
        let blob_path = self.blob_path(&identifier);

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &upload.bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let extension = upload.extension();
        Ok(media_url(
            &self.public_base_url,
            Utc::now().timestamp(),
            &identifier,
            extension.as_deref(),
        ))
    }

    async fn remove(&self, identifier: &str) -> Result<bool, StorageError> {
        validate_relative_path(identifier)?;
        match fs::remove_file(self.blob_path(identifier)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_relative_path(identifier)?;
        match fs::read(self.blob_path(identifier)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
