//! Content and participation records as the services see them.
//!
//! These types are storage-agnostic: the sea-orm entities and the in-memory
//! repositories both convert to and from them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::ServiceError;

/// Upper bound on title length, in Unicode characters.
pub const MAX_TITLE_CHARS: usize = 256;

/// Which table a content record lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Activity,
    Event,
}

impl ContentKind {
    /// Folder hint passed to the media store for this kind's images.
    pub fn media_folder(self) -> &'static str {
        match self {
            ContentKind::Activity => "activities",
            ContentKind::Event => "events",
        }
    }

    /// Only activities carry a gallery.
    pub fn supports_gallery(self) -> bool {
        matches!(self, ContentKind::Activity)
    }

    /// Only events carry a capacity.
    pub fn supports_capacity(self) -> bool {
        matches!(self, ContentKind::Event)
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Activity => "Activity",
            ContentKind::Event => "Event",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Activity => f.write_str("activity"),
            ContentKind::Event => f.write_str("event"),
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Scalar attributes of a content record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentFields {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Events only. `None` or `0` means unbounded.
    pub capacity: Option<i32>,
}

impl ContentFields {
    pub fn validate(&self, kind: ContentKind) -> Result<(), ServiceError> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return Err(ServiceError::Validation(format!(
                "Title must be 1-{MAX_TITLE_CHARS} characters"
            )));
        }
        if self.price_cents.is_some_and(|price| price < 0) {
            return Err(ServiceError::Validation("Price must be >= 0".into()));
        }
        if let Some(capacity) = self.capacity {
            if !kind.supports_capacity() {
                return Err(ServiceError::Validation(format!(
                    "{} records have no capacity",
                    kind.label()
                )));
            }
            if capacity < 0 {
                return Err(ServiceError::Validation("Capacity must be >= 0".into()));
            }
        }
        if let (Some(starts_at), Some(ends_at)) = (self.starts_at, self.ends_at)
            && ends_at <= starts_at
        {
            return Err(ServiceError::Validation(
                "ends_at must be after starts_at".into(),
            ));
        }
        Ok(())
    }

    /// Overwrite the fields present in `patch`.
    pub fn apply(&mut self, patch: &ContentPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(price_cents) = patch.price_cents {
            self.price_cents = price_cents;
        }
        if let Some(starts_at) = patch.starts_at {
            self.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            self.ends_at = ends_at;
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
    }
}

/// Partial update of [`ContentFields`].
///
/// Outer `None` leaves a field unchanged; for nullable fields `Some(None)`
/// clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub price_cents: Option<Option<i64>>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub capacity: Option<Option<i32>>,
}

/// An activity or event together with its image references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: Uuid,
    pub kind: ContentKind,
    pub owner_id: String,
    pub cover_image: Option<String>,
    /// Display order. Always empty for events.
    pub gallery_images: Vec<String>,
    pub fields: ContentFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Every blob URL the record references, cover first.
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.cover_image
            .iter()
            .chain(self.gallery_images.iter())
            .map(String::as_str)
    }

    pub fn apply(&mut self, patch: &RecordPatch, now: DateTime<Utc>) {
        self.fields.apply(&patch.fields);
        if let Some(cover) = &patch.cover_image {
            self.cover_image = Some(cover.clone());
        }
        if let Some(gallery) = &patch.gallery_images {
            self.gallery_images = gallery.clone();
        }
        self.updated_at = now;
    }
}

/// A record about to be inserted; the repository assigns id and timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewContentRecord {
    pub kind: ContentKind,
    pub owner_id: String,
    pub fields: ContentFields,
    pub cover_image: Option<String>,
    pub gallery_images: Vec<String>,
}

/// Column changes for a single row update. `None` leaves a column untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub fields: ContentPatch,
    pub cover_image: Option<String>,
    pub gallery_images: Option<Vec<String>>,
}

/// Filter and page for listing records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
    pub owner_id: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            owner_id: None,
        }
    }
}

/// One page of records plus the total across all pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// The page and page size that were served, after clamping.
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        Self {
            items,
            total,
            page: query.page,
            per_page: query.per_page,
        }
    }
}

/// A user's seat at an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipationEntry {
    pub event_id: Uuid,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Participants of an event, ordered by join time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRoster {
    pub event_id: Uuid,
    pub capacity: Option<i32>,
    pub participant_count: u64,
    pub entries: Vec<ParticipationEntry>,
}

/// Seat limit for a stored capacity; `None` when unbounded.
pub fn seat_limit(capacity: Option<i32>) -> Option<u64> {
    capacity.filter(|c| *c > 0).map(|c| c as u64)
}
