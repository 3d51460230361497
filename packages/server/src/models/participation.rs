use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{EventRoster, ParticipationEntry};

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipationResponse {
    pub event_id: Uuid,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

impl From<ParticipationEntry> for ParticipationResponse {
    fn from(e: ParticipationEntry) -> Self {
        Self {
            event_id: e.event_id,
            user_id: e.user_id,
            joined_at: e.joined_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RosterResponse {
    pub event_id: Uuid,
    /// `null` or 0 when unbounded.
    pub capacity: Option<i32>,
    pub participant_count: u64,
    /// Ordered by join time.
    pub participants: Vec<ParticipationResponse>,
}

impl From<EventRoster> for RosterResponse {
    fn from(r: EventRoster) -> Self {
        Self {
            event_id: r.event_id,
            capacity: r.capacity,
            participant_count: r.participant_count,
            participants: r.entries.into_iter().map(Into::into).collect(),
        }
    }
}
