use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Pagination, double_option};
use crate::domain::{ContentFields, ContentKind, ContentPatch, ContentRecord, ListQuery};
use crate::services::{DeleteReport, SavedRecord, SkippedUpload};

/// JSON `payload` part of a create request.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateContentPayload {
    #[schema(example = "Sunrise hike")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub category: Option<String>,
    /// Price in cents. Omit for free.
    pub price_cents: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Events only. 0 or omitted means unbounded.
    pub capacity: Option<i32>,
}

impl From<CreateContentPayload> for ContentFields {
    fn from(p: CreateContentPayload) -> Self {
        Self {
            title: p.title,
            description: p.description,
            location: p.location,
            category: p.category,
            price_cents: p.price_cents,
            starts_at: p.starts_at,
            ends_at: p.ends_at,
            capacity: p.capacity,
        }
    }
}

/// JSON `payload` part of an update request. Absent fields stay unchanged;
/// `null` clears a nullable field.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateContentPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub price_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub ends_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub capacity: Option<Option<i32>>,
    /// Existing gallery URLs to keep, in display order. Omit to keep the
    /// gallery unchanged.
    pub kept_gallery_images: Option<Vec<String>>,
}

impl UpdateContentPayload {
    /// Split into the field patch and the kept gallery list.
    pub fn into_parts(self) -> (ContentPatch, Option<Vec<String>>) {
        let patch = ContentPatch {
            title: self.title,
            description: self.description,
            location: self.location,
            category: self.category,
            price_cents: self.price_cents,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            capacity: self.capacity,
        };
        (patch, self.kept_gallery_images)
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ContentListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Only records created by this user.
    pub owner_id: Option<String>,
}

impl From<ContentListQuery> for ListQuery {
    fn from(q: ContentListQuery) -> Self {
        let defaults = ListQuery::default();
        Self {
            page: q.page.unwrap_or(defaults.page),
            per_page: q.per_page.unwrap_or(defaults.per_page),
            owner_id: q.owner_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct SkippedUploadResponse {
    pub file_name: String,
    pub reason: String,
}

impl From<SkippedUpload> for SkippedUploadResponse {
    fn from(s: SkippedUpload) -> Self {
        Self {
            file_name: s.file_name,
            reason: s.reason,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentResponse {
    pub id: Uuid,
    pub kind: ContentKind,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    pub cover_image: Option<String>,
    pub gallery_images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Gallery files left out of the record. Only present after a create or
    /// update with partial gallery uploads enabled.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_uploads: Vec<SkippedUploadResponse>,
}

impl From<ContentRecord> for ContentResponse {
    fn from(r: ContentRecord) -> Self {
        Self {
            id: r.id,
            kind: r.kind,
            owner_id: r.owner_id,
            title: r.fields.title,
            description: r.fields.description,
            location: r.fields.location,
            category: r.fields.category,
            price_cents: r.fields.price_cents,
            starts_at: r.fields.starts_at,
            ends_at: r.fields.ends_at,
            capacity: r.fields.capacity,
            cover_image: r.cover_image,
            gallery_images: r.gallery_images,
            created_at: r.created_at,
            updated_at: r.updated_at,
            skipped_uploads: Vec::new(),
        }
    }
}

impl From<SavedRecord> for ContentResponse {
    fn from(saved: SavedRecord) -> Self {
        let mut response = Self::from(saved.record);
        response.skipped_uploads = saved.skipped_uploads.into_iter().map(Into::into).collect();
        response
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentListResponse {
    pub data: Vec<ContentResponse>,
    pub pagination: Pagination,
}

/// Blob cleanup summary of a delete.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteContentResponse {
    pub removal_attempts: usize,
    pub removed: usize,
    pub already_gone: usize,
    pub unresolved: usize,
    /// Image URLs that could not be removed from the media store.
    pub failed: Vec<String>,
}

impl From<DeleteReport> for DeleteContentResponse {
    fn from(r: DeleteReport) -> Self {
        Self {
            removal_attempts: r.removal_attempts,
            removed: r.removed,
            already_gone: r.already_gone,
            unresolved: r.unresolved,
            failed: r.failed,
        }
    }
}
