use common::storage::StorageError;
use thiserror::Error;

use crate::repository::RepositoryError;

/// Every way a content or participation operation can fail.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Only the owner may modify this record")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Already joined this event")]
    AlreadyJoined,

    #[error("Not participating in this event")]
    NotParticipating,

    #[error("Event is full ({capacity} seats)")]
    CapacityExceeded { capacity: i32 },

    #[error("Upload of '{file_name}' failed: {source}")]
    UploadFailed {
        file_name: String,
        #[source]
        source: StorageError,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("{0}")]
    Validation(String),
}
