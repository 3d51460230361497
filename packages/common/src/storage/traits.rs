use async_trait::async_trait;

use super::error::StorageError;
use super::identifier;

/// A single file handed to the media store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaUpload {
    /// Client-side file name, used for the extension of the public URL.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Extension for the stored blob's public URL.
    pub fn extension(&self) -> Option<String> {
        identifier::upload_extension(&self.file_name, self.content_type.as_deref())
    }
}

/// External media storage addressed by public URL.
///
/// The store owns the bytes; records only hold the URL returned by
/// [`MediaStore::store`]. Nothing cascades: removing a blob is always an
/// explicit call.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an upload under `folder` and return its public URL.
    async fn store(&self, upload: &MediaUpload, folder: &str) -> Result<String, StorageError>;

    /// Remove a blob by its store identifier.
    ///
    /// Returns `true` if the blob was removed, `false` if it did not exist.
    async fn remove(&self, identifier: &str) -> Result<bool, StorageError>;

    /// Read a blob back. `None` when it does not exist.
    async fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Resolve the store identifier behind a public URL.
    fn identifier_from_url(&self, url: &str) -> Option<String> {
        identifier::identifier_from_url(url)
    }
}
