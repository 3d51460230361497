mod error;
mod identifier;
mod traits;

pub mod filesystem;
pub mod memory;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use identifier::{identifier_from_url, media_url, upload_extension, validate_relative_path};
pub use traits::{MediaStore, MediaUpload};
