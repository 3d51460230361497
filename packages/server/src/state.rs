use std::sync::Arc;

use common::storage::MediaStore;

use crate::config::AppConfig;
use crate::repository::{ContentRepository, ParticipationRepository};
use crate::services::{MediaLifecycleCoordinator, ParticipationLedger};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub content: Arc<MediaLifecycleCoordinator>,
    pub participation: Arc<ParticipationLedger>,
    /// Read side of the media store, for serving blobs.
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    /// Wire the services over the given backends.
    pub fn new(
        config: AppConfig,
        content_repo: Arc<dyn ContentRepository>,
        participation_repo: Arc<dyn ParticipationRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let content = MediaLifecycleCoordinator::new(
            content_repo,
            Arc::clone(&media),
            config.media.clone(),
        );
        Self {
            content: Arc::new(content),
            participation: Arc::new(ParticipationLedger::new(participation_repo)),
            media,
            config,
        }
    }
}
