use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::identifier::{media_url, validate_relative_path};
use super::traits::{MediaStore, MediaUpload};

/// In-memory media store for local development and tests.
///
/// Versions are a per-store counter instead of a timestamp so URLs are
/// unique even when issued within the same second.
pub struct MemoryMediaStore {
    public_base_url: String,
    max_size: u64,
    blobs: DashMap<String, Vec<u8>>,
    version: AtomicI64,
}

impl MemoryMediaStore {
    pub fn new(public_base_url: impl Into<String>, max_size: u64) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            max_size,
            blobs: DashMap::new(),
            version: AtomicI64::new(1),
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.blobs.contains_key(identifier)
    }

    /// Whether the blob behind a public URL is still stored.
    pub fn contains_url(&self, url: &str) -> bool {
        self.identifier_from_url(url)
            .is_some_and(|identifier| self.contains(&identifier))
    }

    pub fn get(&self, identifier: &str) -> Option<Vec<u8>> {
        self.blobs.get(identifier).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn store(&self, upload: &MediaUpload, folder: &str) -> Result<String, StorageError> {
        validate_relative_path(folder)?;
        if upload.len() > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: upload.len(),
                limit: self.max_size,
            });
        }

        let identifier = format!("{folder}/{}", uuid::Uuid::now_v7().simple());
        self.blobs.insert(identifier.clone(), upload.bytes.clone());

        let version = self.version.fetch_add(1, Ordering::Relaxed);
        let extension = upload.extension();
        Ok(media_url(
            &self.public_base_url,
            version,
            &identifier,
            extension.as_deref(),
        ))
    }

    async fn remove(&self, identifier: &str) -> Result<bool, StorageError> {
        validate_relative_path(identifier)?;
        Ok(self.blobs.remove(identifier).is_some())
    }

    async fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_relative_path(identifier)?;
        Ok(self.get(identifier))
    }
}
