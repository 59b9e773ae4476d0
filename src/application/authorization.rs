//! Ownership rules for catalog writes.
//!
//! Any registered user may create stores and descriptions and every read is
//! public. Updating or deleting a store or description is reserved to the
//! user that created it, and users may only modify their own profile.

use crate::domain::entities::User;
use crate::error::AppError;

/// Fails with [`AppError::Unauthorized`] unless `actor` created the entity.
pub fn ensure_creator(actor: &User, creator_id: i64, action: &str) -> Result<(), AppError> {
    if actor.id == creator_id {
        Ok(())
    } else {
        tracing::warn!(actor = %actor.user_name, action, "Unauthorized catalog write");
        Err(AppError::unauthorized(action))
    }
}

/// Fails with [`AppError::Unauthorized`] unless `actor` is `target`.
pub fn ensure_self(actor: &User, target: &User, action: &str) -> Result<(), AppError> {
    ensure_creator(actor, target.id, action)
}
