use async_trait::async_trait;
use chrono::Utc;
use ::s3::creds::Credentials;
use ::s3::{Bucket, Region};

use super::error::StorageError;
use super::identifier::{media_url, validate_relative_path};
use super::traits::{MediaStore, MediaUpload};
use crate::config::S3Config;

/// S3-compatible media store.
///
/// Objects are keyed by their store identifier (`{folder}/{uuid}`); the public
/// URL points at the image service configured as `public_base_url`, which
/// serves `/v{version}/{key}.{ext}` from the bucket.
pub struct S3MediaStore {
    bucket: Box<Bucket>,
    public_base_url: String,
    max_size: u64,
}

impl S3MediaStore {
    pub fn new(
        config: &S3Config,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Rejected(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Rejected(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_base_url: public_base_url.into(),
            max_size,
        })
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn store(&self, upload: &MediaUpload, folder: &str) -> Result<String, StorageError> {
        validate_relative_path(folder)?;
        if upload.len() > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: upload.len(),
                limit: self.max_size,
            });
        }

        let identifier = format!("{folder}/{}", uuid::Uuid::now_v7().simple());
        let content_type = upload
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        let response = self
            .bucket
            .put_object_with_content_type(&identifier, &upload.bytes, content_type)
            .await
            .map_err(|e| StorageError::Rejected(e.to_string()))?;
        if !(200..300).contains(&response.status_code()) {
            return Err(StorageError::Rejected(format!(
                "put {identifier} returned {}",
                response.status_code()
            )));
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
        let response = self
            .bucket
            .delete_object(identifier)
            .await
            .map_err(|e| StorageError::Rejected(e.to_string()))?;
        match response.status_code() {
            404 => Ok(false),
            200..=299 => Ok(true),
            status => Err(StorageError::Rejected(format!(
                "delete {identifier} returned {status}"
            ))),
        }
    }

    async fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_relative_path(identifier)?;
        let response = self
            .bucket
            .get_object(identifier)
            .await
            .map_err(|e| StorageError::Rejected(e.to_string()))?;
        match response.status_code() {
            404 => Ok(None),
            200..=299 => Ok(Some(response.to_vec())),
            status => Err(StorageError::Rejected(format!(
                "get {identifier} returned {status}"
            ))),
        }
    }
}
