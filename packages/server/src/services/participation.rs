use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{EventRoster, Identity, ParticipationEntry};
use crate::repository::{JoinOutcome, LeaveOutcome, ParticipationRepository};
use crate::services::ServiceError;
use crate::services::ownership::require_identity;

/// Join and leave events under their seat limit.
///
/// Callers only ever act on their own entry, so no ownership check applies
/// beyond resolving the identity.
pub struct ParticipationLedger {
    repo: Arc<dyn ParticipationRepository>,
}

impl ParticipationLedger {
    pub fn new(repo: Arc<dyn ParticipationRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, actor), fields(event_id = %event_id))]
    pub async fn join(
        &self,
        actor: Option<&Identity>,
        event_id: Uuid,
    ) -> Result<ParticipationEntry, ServiceError> {
        let actor = require_identity(actor)?;

        match self
            .repo
            .try_join(event_id, &actor.user_id, Utc::now())
            .await?
        {
            JoinOutcome::Joined(entry) => {
                debug!(user_id = %actor.user_id, "Joined event");
                Ok(entry)
            }
            JoinOutcome::EventMissing => Err(ServiceError::NotFound("Event")),
            JoinOutcome::Full { capacity } => Err(ServiceError::CapacityExceeded { capacity }),
            JoinOutcome::AlreadyJoined => Err(ServiceError::AlreadyJoined),
        }
    }

    #[instrument(skip(self, actor), fields(event_id = %event_id))]
    pub async fn leave(&self, actor: Option<&Identity>, event_id: Uuid) -> Result<(), ServiceError> {
        let actor = require_identity(actor)?;

        match self.repo.leave(event_id, &actor.user_id).await? {
            LeaveOutcome::Left => Ok(()),
            LeaveOutcome::EventMissing => Err(ServiceError::NotFound("Event")),
            LeaveOutcome::NotParticipating => Err(ServiceError::NotParticipating),
        }
    }

    pub async fn roster(&self, event_id: Uuid) -> Result<EventRoster, ServiceError> {
        self.repo
            .roster(event_id)
            .await?
            .ok_or(ServiceError::NotFound("Event"))
    }
}
