//! Keeps content rows and their blobs in the media store consistent.
//!
//! Uploads always happen before the row write that references them, and old
//! blobs are only removed after the row write that dropped them succeeded.
//! A record therefore never points at a missing blob. The price is a bounded
//! leak: blobs uploaded for an operation that later fails are not rolled back.

use std::collections::HashSet;
use std::sync::Arc;

use common::storage::{MediaStore, MediaUpload, StorageError};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    ContentFields, ContentKind, ContentPatch, ContentRecord, Identity, ListQuery,
    NewContentRecord, Page, RecordPatch,
};
use crate::repository::{ContentRepository, RepositoryError};
use crate::services::ServiceError;
use crate::services::ownership::{require_identity, require_owner};

/// Upper bound on `per_page` for listings.
pub const MAX_PER_PAGE: u64 = 100;

fn default_max_gallery_images() -> usize {
    12
}

/// How the coordinator treats gallery uploads and dropped blobs.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MediaPolicy {
    /// Keep the uploads that succeeded when some gallery files fail.
    /// When `false`, any failed gallery file aborts the whole operation.
    #[serde(default)]
    pub gallery_partial_uploads: bool,

    /// Remove gallery blobs an update did not keep.
    #[serde(default)]
    pub reclaim_dropped_gallery: bool,

    #[serde(default = "default_max_gallery_images")]
    pub max_gallery_images: usize,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            gallery_partial_uploads: false,
            reclaim_dropped_gallery: false,
            max_gallery_images: default_max_gallery_images(),
        }
    }
}

/// Input of [`MediaLifecycleCoordinator::create`].
#[derive(Clone, Debug, Default)]
pub struct CreateRequest {
    pub fields: ContentFields,
    pub cover: Option<MediaUpload>,
    pub gallery: Vec<MediaUpload>,
}

/// Input of [`MediaLifecycleCoordinator::update`].
#[derive(Clone, Debug, Default)]
pub struct UpdateRequest {
    pub patch: ContentPatch,
    pub cover: Option<MediaUpload>,
    /// Appended after the kept images, in upload order.
    pub gallery: Vec<MediaUpload>,
    /// Existing gallery URLs to retain, in display order. `None` keeps the
    /// current gallery as is.
    pub kept_gallery: Option<Vec<String>>,
}

/// Result of one gallery file upload.
#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    pub result: Result<String, StorageError>,
}

/// Per-file outcomes of one gallery fan-out, in submission order.
#[derive(Debug, Default)]
pub struct UploadBatch {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadBatch {
    fn stored(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(String::as_str)
    }

    /// Split into stored URLs and failures, both in submission order.
    pub fn into_parts(self) -> (Vec<String>, Vec<(String, StorageError)>) {
        let mut urls = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(url) => urls.push(url),
                Err(e) => failures.push((outcome.file_name, e)),
            }
        }
        (urls, failures)
    }
}

/// A gallery file that was left out of a record under the partial policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedUpload {
    pub file_name: String,
    pub reason: String,
}

/// A created or updated record plus any gallery files that did not make it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedRecord {
    pub record: ContentRecord,
    pub skipped_uploads: Vec<SkippedUpload>,
}

/// What happened to one blob during reclamation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reclaim {
    Removed,
    AlreadyGone,
    /// The URL carried no store identifier; cleanup was skipped.
    Unresolved,
    Failed,
}

/// Blob reclamation summary of a delete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// `remove` calls issued against the media store.
    pub removal_attempts: usize,
    pub removed: usize,
    pub already_gone: usize,
    pub unresolved: usize,
    /// URLs whose removal failed and were left behind.
    pub failed: Vec<String>,
}

impl DeleteReport {
    fn record(&mut self, url: &str, outcome: Reclaim) {
        match outcome {
            Reclaim::Removed => {
                self.removal_attempts += 1;
                self.removed += 1;
            }
            Reclaim::AlreadyGone => {
                self.removal_attempts += 1;
                self.already_gone += 1;
            }
            Reclaim::Unresolved => self.unresolved += 1,
            Reclaim::Failed => {
                self.removal_attempts += 1;
                self.failed.push(url.to_string());
            }
        }
    }
}

fn row_error(kind: ContentKind, err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Missing { .. } => ServiceError::NotFound(kind.label()),
        other => ServiceError::Persistence(other),
    }
}

/// Orchestrates create, update and delete of content records together with
/// their cover and gallery blobs.
pub struct MediaLifecycleCoordinator {
    repo: Arc<dyn ContentRepository>,
    media: Arc<dyn MediaStore>,
    policy: MediaPolicy,
}

impl MediaLifecycleCoordinator {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        media: Arc<dyn MediaStore>,
        policy: MediaPolicy,
    ) -> Self {
        Self {
            repo,
            media,
            policy,
        }
    }

    /// Upload the images, then insert the row that references them.
    #[instrument(skip(self, actor, request), fields(kind = %kind, owner_id = tracing::field::Empty))]
    pub async fn create(
        &self,
        actor: Option<&Identity>,
        kind: ContentKind,
        request: CreateRequest,
    ) -> Result<SavedRecord, ServiceError> {
        let owner = require_identity(actor)?;
        tracing::Span::current().record("owner_id", owner.user_id.as_str());

        let mut fields = request.fields;
        fields.title = fields.title.trim().to_string();
        fields.validate(kind)?;
        self.check_gallery(kind, request.gallery.len())?;

        let cover_image = match &request.cover {
            Some(upload) => Some(self.upload_cover(kind, upload).await?),
            None => None,
        };
        let batch = self.upload_gallery(kind, &request.gallery).await;
        let (gallery_images, skipped_uploads) =
            self.settle_gallery(batch, cover_image.iter().map(String::as_str))?;

        let new_record = NewContentRecord {
            kind,
            owner_id: owner.user_id.clone(),
            fields,
            cover_image: cover_image.clone(),
            gallery_images: gallery_images.clone(),
        };
        let record = self.repo.insert(new_record).await.map_err(|e| {
            let leaked = cover_image.iter().count() + gallery_images.len();
            warn!(error = %e, leaked, "Insert failed; uploaded blobs left unreferenced");
            ServiceError::Persistence(e)
        })?;

        debug!(id = %record.id, "Record created");
        Ok(SavedRecord {
            record,
            skipped_uploads,
        })
    }

    /// Patch a record the caller owns, swapping images as requested.
    ///
    /// The old cover is removed only after the row update went through, and
    /// only when its URL resolves to a store identifier.
    #[instrument(skip(self, actor, request), fields(kind = %kind, id = %id))]
    pub async fn update(
        &self,
        actor: Option<&Identity>,
        kind: ContentKind,
        id: Uuid,
        request: UpdateRequest,
    ) -> Result<SavedRecord, ServiceError> {
        let actor = require_identity(actor)?;
        let existing = self
            .repo
            .find(kind, id)
            .await?
            .ok_or(ServiceError::NotFound(kind.label()))?;
        require_owner(actor, &existing.owner_id)?;

        let mut merged = existing.fields.clone();
        merged.apply(&request.patch);
        merged.validate(kind)?;

        if let Some(kept) = &request.kept_gallery {
            if !kind.supports_gallery() && !kept.is_empty() {
                return Err(ServiceError::Validation(format!(
                    "{} records have no gallery",
                    kind.label()
                )));
            }
            let current: HashSet<&str> =
                existing.gallery_images.iter().map(String::as_str).collect();
            if let Some(foreign) = kept.iter().find(|url| !current.contains(url.as_str())) {
                return Err(ServiceError::Validation(format!(
                    "Kept gallery image is not part of this record: {foreign}"
                )));
            }
            let mut seen = HashSet::with_capacity(kept.len());
            if let Some(repeated) = kept.iter().find(|url| !seen.insert(url.as_str())) {
                return Err(ServiceError::Validation(format!(
                    "Kept gallery image listed more than once: {repeated}"
                )));
            }
        }
        let base_gallery = request
            .kept_gallery
            .clone()
            .unwrap_or_else(|| existing.gallery_images.clone());
        self.check_gallery(kind, base_gallery.len() + request.gallery.len())?;

        let new_cover = match &request.cover {
            Some(upload) => Some(self.upload_cover(kind, upload).await?),
            None => None,
        };
        let batch = self.upload_gallery(kind, &request.gallery).await;
        let (new_gallery, skipped_uploads) =
            self.settle_gallery(batch, new_cover.iter().map(String::as_str))?;

        let gallery_images = if request.kept_gallery.is_none() && new_gallery.is_empty() {
            None
        } else {
            let mut gallery = base_gallery;
            gallery.extend(new_gallery.iter().cloned());
            Some(gallery)
        };

        let patch = RecordPatch {
            fields: request.patch,
            cover_image: new_cover.clone(),
            gallery_images,
        };
        let record = self.repo.update(kind, id, patch).await.map_err(|e| {
            let leaked = new_cover.iter().count() + new_gallery.len();
            warn!(error = %e, leaked, "Update failed; uploaded blobs left unreferenced");
            row_error(kind, e)
        })?;

        if let (Some(new_url), Some(old_url)) = (&new_cover, &existing.cover_image)
            && new_url != old_url
        {
            self.reclaim(old_url).await;
        }

        if self.policy.reclaim_dropped_gallery
            && let Some(kept) = &request.kept_gallery
        {
            let kept: HashSet<&str> = kept.iter().map(String::as_str).collect();
            let dropped = existing
                .gallery_images
                .iter()
                .filter(|url| !kept.contains(url.as_str()));
            join_all(dropped.map(|url| self.reclaim(url))).await;
        }

        Ok(SavedRecord {
            record,
            skipped_uploads,
        })
    }

    /// Delete a record the caller owns and reclaim every blob it referenced.
    ///
    /// The row goes first and blob removal follows it, the reverse of the
    /// reclaim-then-delete order, so no stored record ever references a
    /// removed blob. Removal failures are logged and reported but never fail
    /// the delete.
    #[instrument(skip(self, actor), fields(kind = %kind, id = %id))]
    pub async fn delete(
        &self,
        actor: Option<&Identity>,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<DeleteReport, ServiceError> {
        let actor = require_identity(actor)?;
        let existing = self
            .repo
            .find(kind, id)
            .await?
            .ok_or(ServiceError::NotFound(kind.label()))?;
        require_owner(actor, &existing.owner_id)?;

        self.repo
            .delete(kind, id)
            .await
            .map_err(|e| row_error(kind, e))?;

        let urls: Vec<&str> = existing.image_urls().collect();
        let outcomes = join_all(urls.iter().map(|url| self.reclaim(url))).await;

        let mut report = DeleteReport::default();
        for (url, outcome) in urls.iter().zip(outcomes) {
            report.record(url, outcome);
        }
        if !report.failed.is_empty() {
            warn!(failed = report.failed.len(), "Record deleted with residual blobs");
        }
        Ok(report)
    }

    pub async fn get(&self, kind: ContentKind, id: Uuid) -> Result<ContentRecord, ServiceError> {
        self.repo
            .find(kind, id)
            .await?
            .ok_or(ServiceError::NotFound(kind.label()))
    }

    /// One page of records, newest first. `page` is raised to at least 1
    /// and `per_page` clamped to `1..=MAX_PER_PAGE`; the returned page
    /// carries the values actually used.
    pub async fn list(
        &self,
        kind: ContentKind,
        query: ListQuery,
    ) -> Result<Page<ContentRecord>, ServiceError> {
        let query = ListQuery {
            page: query.page.max(1),
            per_page: query.per_page.clamp(1, MAX_PER_PAGE),
            owner_id: query.owner_id,
        };
        Ok(self.repo.list(kind, &query).await?)
    }

    fn check_gallery(&self, kind: ContentKind, count: usize) -> Result<(), ServiceError> {
        if count == 0 {
            return Ok(());
        }
        if !kind.supports_gallery() {
            return Err(ServiceError::Validation(format!(
                "{} records have no gallery",
                kind.label()
            )));
        }
        if count > self.policy.max_gallery_images {
            return Err(ServiceError::Validation(format!(
                "At most {} gallery images allowed",
                self.policy.max_gallery_images
            )));
        }
        Ok(())
    }

    async fn upload_cover(
        &self,
        kind: ContentKind,
        upload: &MediaUpload,
    ) -> Result<String, ServiceError> {
        self.media
            .store(upload, kind.media_folder())
            .await
            .map_err(|source| ServiceError::UploadFailed {
                file_name: upload.file_name.clone(),
                source,
            })
    }

    /// Launch every gallery upload at once and wait for all of them.
    async fn upload_gallery(&self, kind: ContentKind, uploads: &[MediaUpload]) -> UploadBatch {
        let folder = kind.media_folder();
        let outcomes = join_all(uploads.iter().map(|upload| async move {
            UploadOutcome {
                file_name: upload.file_name.clone(),
                result: self.media.store(upload, folder).await,
            }
        }))
        .await;
        UploadBatch { outcomes }
    }

    /// Apply the gallery policy to a finished batch.
    ///
    /// `earlier` lists blobs already uploaded in this operation, for leak
    /// accounting when the batch aborts the operation.
    fn settle_gallery<'a>(
        &self,
        batch: UploadBatch,
        earlier: impl Iterator<Item = &'a str>,
    ) -> Result<(Vec<String>, Vec<SkippedUpload>), ServiceError> {
        let leaked = earlier.count() + batch.stored().count();
        let (urls, mut failures) = batch.into_parts();

        if !self.policy.gallery_partial_uploads && !failures.is_empty() {
            if leaked > 0 {
                warn!(leaked, "Gallery upload failed; uploaded blobs left unreferenced");
            }
            let (file_name, source) = failures.swap_remove(0);
            return Err(ServiceError::UploadFailed { file_name, source });
        }

        let skipped = failures
            .into_iter()
            .map(|(file_name, e)| {
                warn!(file_name = %file_name, error = %e, "Skipping failed gallery upload");
                SkippedUpload {
                    file_name,
                    reason: e.to_string(),
                }
            })
            .collect();
        Ok((urls, skipped))
    }

    /// Best-effort removal of the blob behind `url`.
    async fn reclaim(&self, url: &str) -> Reclaim {
        let Some(identifier) = self.media.identifier_from_url(url) else {
            debug!(url, "No store identifier in URL; skipping cleanup");
            return Reclaim::Unresolved;
        };
        match self.media.remove(&identifier).await {
            Ok(true) => Reclaim::Removed,
            Ok(false) => Reclaim::AlreadyGone,
            Err(e) => {
                warn!(url, error = %e, "Failed to remove blob");
                Reclaim::Failed
            }
        }
    }
}
