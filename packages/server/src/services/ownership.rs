//! Who may mutate a content record.
//!
//! Every owner check in the crate goes through here, so a future override
//! (moderators, admins) has exactly one place to land.

use crate::domain::Identity;
use crate::services::ServiceError;

/// Outcome of an ownership check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Decide whether `actor` may mutate a record owned by `owner_id`.
pub fn allow(actor: &Identity, owner_id: &str) -> Access {
    if actor.user_id == owner_id {
        Access::Allow
    } else {
        Access::Deny
    }
}

/// [`allow`], with `Deny` mapped to [`ServiceError::Forbidden`].
pub fn require_owner(actor: &Identity, owner_id: &str) -> Result<(), ServiceError> {
    match allow(actor, owner_id) {
        Access::Allow => Ok(()),
        Access::Deny => Err(ServiceError::Forbidden),
    }
}

/// Resolve the caller or fail with [`ServiceError::Unauthorized`].
pub fn require_identity(actor: Option<&Identity>) -> Result<&Identity, ServiceError> {
    actor.ok_or(ServiceError::Unauthorized)
}
