//! Row storage for content records and participation entries.
//!
//! Every method addresses rows by primary key; no method spans more than one
//! record except [`ContentRepository::list`], which is read-only.

pub mod memory;
pub mod sea;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    ContentKind, ContentRecord, EventRoster, ListQuery, NewContentRecord, Page,
    ParticipationEntry, RecordPatch,
};

pub use memory::MemoryRepository;
pub use sea::SeaRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Db(DbErr),

    #[error("{kind} {id} no longer exists")]
    Missing { kind: ContentKind, id: Uuid },

    #[error("Corrupt row {id}: {detail}")]
    Corrupt { id: Uuid, detail: String },

    #[error("Row store unavailable: {0}")]
    Unavailable(String),
}

impl From<DbErr> for RepositoryError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(e) => Self::Unavailable(e.to_string()),
            DbErr::Conn(e) => Self::Unavailable(e.to_string()),
            other => Self::Db(other),
        }
    }
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find(
        &self,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<Option<ContentRecord>, RepositoryError>;

    /// Insert a record and return it with its assigned id.
    async fn insert(&self, record: NewContentRecord) -> Result<ContentRecord, RepositoryError>;

    /// Apply `patch` to one row and return the row as stored afterwards.
    async fn update(
        &self,
        kind: ContentKind,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<ContentRecord, RepositoryError>;

    /// Delete one row. Deleting an event also drops its participation entries.
    async fn delete(&self, kind: ContentKind, id: Uuid) -> Result<(), RepositoryError>;

    /// Newest first.
    async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
    ) -> Result<Page<ContentRecord>, RepositoryError>;
}

/// Result of an atomic join attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(ParticipationEntry),
    EventMissing,
    Full { capacity: i32 },
    AlreadyJoined,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    EventMissing,
    NotParticipating,
}

#[async_trait]
pub trait ParticipationRepository: Send + Sync {
    /// Check the seat limit and the `(event, user)` uniqueness and insert the
    /// entry as one atomic step.
    ///
    /// The capacity check comes first: a user who already holds a seat at a
    /// full event gets [`JoinOutcome::Full`].
    async fn try_join(
        &self,
        event_id: Uuid,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, RepositoryError>;

    async fn leave(&self, event_id: Uuid, user_id: &str) -> Result<LeaveOutcome, RepositoryError>;

    /// `None` when the event does not exist.
    async fn roster(&self, event_id: Uuid) -> Result<Option<EventRoster>, RepositoryError>;
}
