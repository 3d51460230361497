mod error;
pub mod media;
pub mod ownership;
pub mod participation;

pub use error::ServiceError;
pub use media::{
    CreateRequest, DeleteReport, MediaLifecycleCoordinator, MediaPolicy, SavedRecord,
    SkippedUpload, UpdateRequest,
};
pub use participation::ParticipationLedger;
