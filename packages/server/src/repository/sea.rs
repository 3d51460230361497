use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::Json;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use super::{
    ContentRepository, JoinOutcome, LeaveOutcome, ParticipationRepository, RepositoryError,
};
use crate::domain::{
    ContentFields, ContentKind, ContentRecord, EventRoster, ListQuery, NewContentRecord, Page,
    ParticipationEntry, RecordPatch, seat_limit,
};
use crate::entity::{activity, event, participant};

/// Postgres-backed repository over the sea-orm entities.
#[derive(Clone)]
pub struct SeaRepository {
    db: DatabaseConnection,
}

impl SeaRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn activity_record(model: activity::Model) -> Result<ContentRecord, RepositoryError> {
    let gallery_images: Vec<String> = serde_json::from_value(model.gallery_images.clone())
        .map_err(|e| RepositoryError::Corrupt {
            id: model.id,
            detail: format!("gallery_images: {e}"),
        })?;

    Ok(ContentRecord {
        id: model.id,
        kind: ContentKind::Activity,
        owner_id: model.owner_id,
        cover_image: model.cover_image,
        gallery_images,
        fields: ContentFields {
            title: model.title,
            description: model.description,
            location: model.location,
            category: model.category,
            price_cents: model.price_cents,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            capacity: None,
        },
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn event_record(model: event::Model) -> ContentRecord {
    ContentRecord {
        id: model.id,
        kind: ContentKind::Event,
        owner_id: model.owner_id,
        cover_image: model.cover_image,
        gallery_images: Vec::new(),
        fields: ContentFields {
            title: model.title,
            description: model.description,
            location: model.location,
            category: model.category,
            price_cents: model.price_cents,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            capacity: model.capacity,
        },
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn participation_entry(model: participant::Model) -> ParticipationEntry {
    ParticipationEntry {
        event_id: model.event_id,
        user_id: model.user_id,
        joined_at: model.joined_at,
    }
}

/// Mark only the columns whose value differs from the stored row.
fn stage_activity(active: &mut activity::ActiveModel, record: &ContentRecord) {
    let f = &record.fields;
    active.title.set_if_not_equals(f.title.clone());
    active.description.set_if_not_equals(f.description.clone());
    active.location.set_if_not_equals(f.location.clone());
    active.category.set_if_not_equals(f.category.clone());
    active.price_cents.set_if_not_equals(f.price_cents);
    active.starts_at.set_if_not_equals(f.starts_at);
    active.ends_at.set_if_not_equals(f.ends_at);
    active.cover_image.set_if_not_equals(record.cover_image.clone());
    active
        .gallery_images
        .set_if_not_equals(Json::from(record.gallery_images.clone()));
    active.updated_at = Set(record.updated_at);
}

fn stage_event(active: &mut event::ActiveModel, record: &ContentRecord) {
    let f = &record.fields;
    active.title.set_if_not_equals(f.title.clone());
    active.description.set_if_not_equals(f.description.clone());
    active.location.set_if_not_equals(f.location.clone());
    active.category.set_if_not_equals(f.category.clone());
    active.price_cents.set_if_not_equals(f.price_cents);
    active.starts_at.set_if_not_equals(f.starts_at);
    active.ends_at.set_if_not_equals(f.ends_at);
    active.capacity.set_if_not_equals(f.capacity);
    active.cover_image.set_if_not_equals(record.cover_image.clone());
    active.updated_at = Set(record.updated_at);
}

fn page_bounds(query: &ListQuery) -> (u64, u64) {
    let per_page = Ord::max(query.per_page, 1);
    ((Ord::max(query.page, 1) - 1) * per_page, per_page)
}

#[async_trait]
impl ContentRepository for SeaRepository {
    async fn find(
        &self,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<Option<ContentRecord>, RepositoryError> {
        match kind {
            ContentKind::Activity => activity::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(activity_record)
                .transpose(),
            ContentKind::Event => Ok(event::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(event_record)),
        }
    }

    async fn insert(&self, record: NewContentRecord) -> Result<ContentRecord, RepositoryError> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let f = record.fields;

        match record.kind {
            ContentKind::Activity => {
                let model = activity::ActiveModel {
                    id: Set(id),
                    owner_id: Set(record.owner_id),
                    title: Set(f.title),
                    description: Set(f.description),
                    location: Set(f.location),
                    category: Set(f.category),
                    price_cents: Set(f.price_cents),
                    starts_at: Set(f.starts_at),
                    ends_at: Set(f.ends_at),
                    cover_image: Set(record.cover_image),
                    gallery_images: Set(Json::from(record.gallery_images)),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
                activity_record(model)
            }
            ContentKind::Event => {
                let model = event::ActiveModel {
                    id: Set(id),
                    owner_id: Set(record.owner_id),
                    title: Set(f.title),
                    description: Set(f.description),
                    location: Set(f.location),
                    category: Set(f.category),
                    price_cents: Set(f.price_cents),
                    starts_at: Set(f.starts_at),
                    ends_at: Set(f.ends_at),
                    capacity: Set(f.capacity),
                    cover_image: Set(record.cover_image),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
                Ok(event_record(model))
            }
        }
    }

    async fn update(
        &self,
        kind: ContentKind,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<ContentRecord, RepositoryError> {
        let now = Utc::now();
        match kind {
            ContentKind::Activity => {
                let existing = activity::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or(RepositoryError::Missing { kind, id })?;
                let mut record = activity_record(existing.clone())?;
                record.apply(&patch, now);

                let mut active: activity::ActiveModel = existing.into();
                stage_activity(&mut active, &record);
                activity_record(active.update(&self.db).await?)
            }
            ContentKind::Event => {
                let existing = event::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or(RepositoryError::Missing { kind, id })?;
                let mut record = event_record(existing.clone());
                record.apply(&patch, now);

                let mut active: event::ActiveModel = existing.into();
                stage_event(&mut active, &record);
                Ok(event_record(active.update(&self.db).await?))
            }
        }
    }

    async fn delete(&self, kind: ContentKind, id: Uuid) -> Result<(), RepositoryError> {
        let rows_affected = match kind {
            ContentKind::Activity => {
                activity::Entity::delete_by_id(id)
                    .exec(&self.db)
                    .await?
                    .rows_affected
            }
            ContentKind::Event => {
                let txn = self.db.begin().await?;
                participant::Entity::delete_many()
                    .filter(participant::Column::EventId.eq(id))
                    .exec(&txn)
                    .await?;
                let result = event::Entity::delete_by_id(id).exec(&txn).await?;
                txn.commit().await?;
                result.rows_affected
            }
        };

        if rows_affected == 0 {
            return Err(RepositoryError::Missing { kind, id });
        }
        Ok(())
    }

    async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
    ) -> Result<Page<ContentRecord>, RepositoryError> {
        let (offset, limit) = page_bounds(query);

        match kind {
            ContentKind::Activity => {
                let mut select = activity::Entity::find();
                if let Some(owner) = &query.owner_id {
                    select = select.filter(activity::Column::OwnerId.eq(owner.as_str()));
                }
                let total = select.clone().count(&self.db).await?;
                let items = select
                    .order_by_desc(activity::Column::CreatedAt)
                    .order_by_desc(activity::Column::Id)
                    .offset(Some(offset))
                    .limit(Some(limit))
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(activity_record)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Page::new(items, total, query))
            }
            ContentKind::Event => {
                let mut select = event::Entity::find();
                if let Some(owner) = &query.owner_id {
                    select = select.filter(event::Column::OwnerId.eq(owner.as_str()));
                }
                let total = select.clone().count(&self.db).await?;
                let items = select
                    .order_by_desc(event::Column::CreatedAt)
                    .order_by_desc(event::Column::Id)
                    .offset(Some(offset))
                    .limit(Some(limit))
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(event_record)
                    .collect();
                Ok(Page::new(items, total, query))
            }
        }
    }
}

#[async_trait]
impl ParticipationRepository for SeaRepository {
    async fn try_join(
        &self,
        event_id: Uuid,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, RepositoryError> {
        let txn = self.db.begin().await?;

        // The row lock serializes joins per event until commit.
        let Some(event_model) = event::Entity::find_by_id(event_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(JoinOutcome::EventMissing);
        };

        if let Some(limit) = seat_limit(event_model.capacity) {
            let taken = participant::Entity::find()
                .filter(participant::Column::EventId.eq(event_id))
                .count(&txn)
                .await?;
            if taken >= limit {
                return Ok(JoinOutcome::Full {
                    capacity: event_model.capacity.unwrap_or_default(),
                });
            }
        }

        let existing = participant::Entity::find_by_id((event_id, user_id.to_string()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        let new_entry = participant::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id.to_string()),
            joined_at: Set(joined_at),
        };

        match new_entry.insert(&txn).await {
            Ok(model) => {
                txn.commit().await?;
                Ok(JoinOutcome::Joined(participation_entry(model)))
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(JoinOutcome::AlreadyJoined)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn leave(&self, event_id: Uuid, user_id: &str) -> Result<LeaveOutcome, RepositoryError> {
        let txn = self.db.begin().await?;
        if event::Entity::find_by_id(event_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .is_none()
        {
            return Ok(LeaveOutcome::EventMissing);
        }

        let result = participant::Entity::delete_by_id((event_id, user_id.to_string()))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        if result.rows_affected == 0 {
            Ok(LeaveOutcome::NotParticipating)
        } else {
            Ok(LeaveOutcome::Left)
        }
    }

    async fn roster(&self, event_id: Uuid) -> Result<Option<EventRoster>, RepositoryError> {
        let Some(event_model) = event::Entity::find_by_id(event_id).one(&self.db).await? else {
            return Ok(None);
        };

        let entries: Vec<ParticipationEntry> = participant::Entity::find()
            .filter(participant::Column::EventId.eq(event_id))
            .order_by_asc(participant::Column::JoinedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(participation_entry)
            .collect();

        Ok(Some(EventRoster {
            event_id,
            capacity: event_model.capacity,
            participant_count: entries.len() as u64,
            entries,
        }))
    }
}
