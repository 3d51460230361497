use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{
    ContentRepository, JoinOutcome, LeaveOutcome, ParticipationRepository, RepositoryError,
};
use crate::domain::{
    ContentKind, ContentRecord, EventRoster, ListQuery, NewContentRecord, Page,
    ParticipationEntry, RecordPatch, seat_limit,
};

/// In-memory row store for local development and tests.
///
/// A join holds the event's participant shard for the whole check-and-insert,
/// which serializes joins per event without any lock spanning an `.await`.
#[derive(Default)]
pub struct MemoryRepository {
    records: DashMap<Uuid, ContentRecord>,
    participants: DashMap<Uuid, Vec<ParticipationEntry>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, kind: ContentKind, id: Uuid) -> Option<ContentRecord> {
        self.records
            .get(&id)
            .filter(|record| record.kind == kind)
            .map(|record| record.value().clone())
    }

    /// Number of participation entries for an event.
    pub fn participant_count(&self, event_id: Uuid) -> usize {
        self.participants
            .get(&event_id)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    async fn find(
        &self,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<Option<ContentRecord>, RepositoryError> {
        Ok(self.get(kind, id))
    }

    async fn insert(&self, record: NewContentRecord) -> Result<ContentRecord, RepositoryError> {
        let now = Utc::now();
        let stored = ContentRecord {
            id: Uuid::now_v7(),
            kind: record.kind,
            owner_id: record.owner_id,
            cover_image: record.cover_image,
            gallery_images: record.gallery_images,
            fields: record.fields,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        kind: ContentKind,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<ContentRecord, RepositoryError> {
        let mut record = self
            .records
            .get_mut(&id)
            .filter(|record| record.kind == kind)
            .ok_or(RepositoryError::Missing { kind, id })?;
        record.apply(&patch, Utc::now());
        Ok(record.value().clone())
    }

    async fn delete(&self, kind: ContentKind, id: Uuid) -> Result<(), RepositoryError> {
        self.records
            .remove_if(&id, |_, record| record.kind == kind)
            .ok_or(RepositoryError::Missing { kind, id })?;
        if kind == ContentKind::Event {
            self.participants.remove(&id);
        }
        Ok(())
    }

    async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
    ) -> Result<Page<ContentRecord>, RepositoryError> {
        let mut matching: Vec<ContentRecord> = self
            .records
            .iter()
            .filter(|record| record.kind == kind)
            .filter(|record| {
                query
                    .owner_id
                    .as_deref()
                    .is_none_or(|owner| record.owner_id == owner)
            })
            .map(|record| record.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let skip = (query.page.saturating_sub(1) * query.per_page) as usize;
        let items = matching
            .into_iter()
            .skip(skip)
            .take(query.per_page as usize)
            .collect();
        Ok(Page::new(items, total, query))
    }
}

#[async_trait]
impl ParticipationRepository for MemoryRepository {
    async fn try_join(
        &self,
        event_id: Uuid,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, RepositoryError> {
        if self.get(ContentKind::Event, event_id).is_none() {
            return Ok(JoinOutcome::EventMissing);
        }
        let mut entries = self.participants.entry(event_id).or_default();

        // The event may have been deleted while we waited for the shard.
        let Some(event) = self.get(ContentKind::Event, event_id) else {
            drop(entries);
            self.participants
                .remove_if(&event_id, |_, entries| entries.is_empty());
            return Ok(JoinOutcome::EventMissing);
        };
        if let Some(limit) = seat_limit(event.fields.capacity)
            && entries.len() as u64 >= limit
        {
            return Ok(JoinOutcome::Full {
                capacity: event.fields.capacity.unwrap_or_default(),
            });
        }
        if entries.iter().any(|entry| entry.user_id == user_id) {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        let entry = ParticipationEntry {
            event_id,
            user_id: user_id.to_string(),
            joined_at,
        };
        entries.push(entry.clone());
        Ok(JoinOutcome::Joined(entry))
    }

    async fn leave(&self, event_id: Uuid, user_id: &str) -> Result<LeaveOutcome, RepositoryError> {
        if self.get(ContentKind::Event, event_id).is_none() {
            return Ok(LeaveOutcome::EventMissing);
        }
        let Some(mut entries) = self.participants.get_mut(&event_id) else {
            return Ok(LeaveOutcome::NotParticipating);
        };
        let before = entries.len();
        entries.retain(|entry| entry.user_id != user_id);
        if entries.len() == before {
            Ok(LeaveOutcome::NotParticipating)
        } else {
            Ok(LeaveOutcome::Left)
        }
    }

    async fn roster(&self, event_id: Uuid) -> Result<Option<EventRoster>, RepositoryError> {
        let Some(event) = self.get(ContentKind::Event, event_id) else {
            return Ok(None);
        };
        let mut entries = self
            .participants
            .get(&event_id)
            .map(|entries| entries.value().clone())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));

        Ok(Some(EventRoster {
            event_id,
            capacity: event.fields.capacity,
            participant_count: entries.len() as u64,
            entries,
        }))
    }
}
