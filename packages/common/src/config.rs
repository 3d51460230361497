use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::storage::filesystem::FilesystemMediaStore;
use crate::storage::memory::MemoryMediaStore;
use crate::storage::{MediaStore, StorageError};

/// Which media store implementation to run.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    Memory,
    S3,
}

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Address the bucket as `{endpoint}/{bucket}` instead of a subdomain.
    #[serde(default)]
    pub path_style: bool,
}

/// Media storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Default: filesystem.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./data/media".
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Prefix of every public media URL. Default: "http://127.0.0.1:3000/media".
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Maximum size of a single upload in bytes. Default: 10 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
    /// Required when `backend = "s3"`.
    #[serde(default)]
    pub s3: Option<S3Config>,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Filesystem
}
fn default_base_path() -> PathBuf {
    PathBuf::from("./data/media")
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:3000/media".into()
}
fn default_max_blob_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_path: default_base_path(),
            public_base_url: default_public_base_url(),
            max_blob_size: default_max_blob_size(),
            s3: None,
        }
    }
}

impl StorageConfig {
    /// Build the configured media store.
    pub async fn build(&self) -> Result<Arc<dyn MediaStore>, StorageError> {
        match self.backend {
            StorageBackend::Filesystem => Ok(Arc::new(
                FilesystemMediaStore::new(
                    self.base_path.clone(),
                    self.public_base_url.clone(),
                    self.max_blob_size,
                )
                .await?,
            )),
            StorageBackend::Memory => Ok(Arc::new(MemoryMediaStore::new(
                self.public_base_url.clone(),
                self.max_blob_size,
            ))),
            StorageBackend::S3 => self.build_s3(),
        }
    }

    #[cfg(feature = "object-storage")]
    fn build_s3(&self) -> Result<Arc<dyn MediaStore>, StorageError> {
        let s3 = self
            .s3
            .as_ref()
            .ok_or_else(|| StorageError::Rejected("storage.s3 section is missing".into()))?;
        Ok(Arc::new(crate::storage::s3::S3MediaStore::new(
            s3,
            self.public_base_url.clone(),
            self.max_blob_size,
        )?))
    }

    #[cfg(not(feature = "object-storage"))]
    fn build_s3(&self) -> Result<Arc<dyn MediaStore>, StorageError> {
        Err(StorageError::Rejected(
            "built without the object-storage feature".into(),
        ))
    }
}
