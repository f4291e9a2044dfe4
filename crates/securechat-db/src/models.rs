//! Database row types. These map directly to SQLite rows and stay
//! independent of the API DTOs in securechat-types.

use chrono::{DateTime, Utc};

pub struct UserRow {
    pub id: String,
    pub phone_number: String,
    pub otp_hash: Option<String>,
    pub is_verified: bool,
    pub created_at: String,
}

pub struct ContactRow {
    pub id: String,
    pub user_id: String,
    pub contact_phone: String,
    pub contact_name: String,
    pub status: String,
}

/// A stored chat entry, without its carrier image (fetched separately).
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub sender_phone: String,
    pub receiver_phone: String,
    pub display_text: String,
    pub decrypt_code: Option<String>,
    pub is_encrypted: bool,
    pub sent_at: DateTime<Utc>,
    pub delete_at: Option<DateTime<Utc>>,
}

impl MessageRow {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.delete_at.is_some_and(|t| t <= now)
    }
}

/// A message about to be inserted. `carrier_image` and `decrypt_code` are
/// present exactly when `is_encrypted` is set.
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_phone: String,
    pub display_text: String,
    pub carrier_image: Option<Vec<u8>>,
    pub decrypt_code: Option<String>,
    pub is_encrypted: bool,
    pub sent_at: DateTime<Utc>,
}
