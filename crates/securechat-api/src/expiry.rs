//! Auto-deletion after reveal.
//!
//! A message is ACTIVE until deletion is armed, which stamps `delete_at`.
//! Nothing runs in the background: expired rows are swept whenever a feed is
//! read, and the read filters by deadline too, so an expired message is
//! never returned even if the sweep lost a race.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use securechat_db::MessageStore;
use securechat_db::models::MessageRow;

use crate::error::{AppError, Result};

pub const DEFAULT_AUTO_DELETE_SECS: i64 = 15;

/// Start (or restart) the countdown: `delete_at = now + delay`.
///
/// A message whose deadline has already passed is gone, swept or not, and
/// cannot be armed again.
pub fn arm<S: MessageStore + ?Sized>(
    store: &S,
    message_id: &str,
    now: DateTime<Utc>,
    delay: TimeDelta,
) -> Result<DateTime<Utc>> {
    if !store.supports_expiry() {
        return Err(AppError::FeatureUnavailable);
    }

    let delete_at = now + delay;
    if !store.update_delete_at(message_id, delete_at, now)? {
        return Err(AppError::NotFound);
    }

    info!("Message {} armed for deletion at {}", message_id, delete_at);
    Ok(delete_at)
}

/// Delete everything whose deadline has passed. Safe to run redundantly.
pub fn sweep<S: MessageStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Result<usize> {
    if !store.supports_expiry() {
        return Ok(0);
    }

    let deleted = store.delete_expired(now)?;
    if deleted > 0 {
        info!("Cleaned up {} expired messages", deleted);
    }
    Ok(deleted)
}

/// Sweep, then list what `phone` may still see.
pub fn visible_messages<S: MessageStore + ?Sized>(
    store: &S,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<Vec<MessageRow>> {
    sweep(store, now)?;

    Ok(store
        .list_messages(phone)?
        .into_iter()
        .filter(|m| !m.is_expired(now))
        .collect())
}
