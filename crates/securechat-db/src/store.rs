use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

use crate::models::{MessageRow, NewMessage};
use crate::queries::OptionalExt;
use crate::{Database, parse_db_time, to_db_time};

/// Persistence seam for the hidden-message lifecycle.
///
/// `Database` is the production implementation; anything that can look rows
/// up by id and keep a binary blob next to text fields will do.
pub trait MessageStore: Send + Sync {
    /// Insert a new message and return its generated id.
    fn insert_message(&self, msg: &NewMessage) -> Result<String>;

    fn get_message(&self, id: &str) -> Result<Option<MessageRow>>;

    /// Messages `phone` sent or received, newest first. Expired rows are not
    /// filtered here.
    fn list_messages(&self, phone: &str) -> Result<Vec<MessageRow>>;

    /// Set the deletion deadline. Returns false when no such message exists
    /// or its current deadline is already at or before `now`.
    fn update_delete_at(
        &self,
        id: &str,
        delete_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Remove every message whose deadline is at or before `now`.
    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    fn get_image_blob(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Whether the schema carries the deletion deadline column.
    fn supports_expiry(&self) -> bool;
}

const MESSAGE_COLUMNS: &str =
    "m.id, m.sender_id, u.phone_number, m.receiver_phone, m.display_text,
     m.decrypt_code, m.is_encrypted, m.sent_at, m.delete_at";

impl MessageStore for Database {
    fn insert_message(&self, msg: &NewMessage) -> Result<String> {
        let sealed = msg.carrier_image.is_some() && msg.decrypt_code.is_some();
        if msg.is_encrypted != sealed {
            bail!("encrypted messages need both a carrier image and a decrypt code");
        }

        let id = Uuid::new_v4().to_string();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages
                    (id, sender_id, receiver_phone, display_text, carrier_image, decrypt_code, is_encrypted, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id,
                    msg.sender_id,
                    msg.receiver_phone,
                    msg.display_text,
                    msg.carrier_image,
                    msg.decrypt_code,
                    msg.is_encrypted,
                    to_db_time(msg.sent_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages m JOIN users u ON m.sender_id = u.id WHERE m.id = ?1",
                MESSAGE_COLUMNS
            );
            conn.query_row(&sql, [id], map_message).optional()
        })
    }

    fn list_messages(&self, phone: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages m JOIN users u ON m.sender_id = u.id
                 WHERE m.receiver_phone = ?1 OR u.phone_number = ?1
                 ORDER BY m.sent_at DESC, m.rowid DESC",
                MESSAGE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([phone], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn update_delete_at(
        &self,
        id: &str,
        delete_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET delete_at = ?1
                 WHERE id = ?2 AND (delete_at IS NULL OR delete_at > ?3)",
                (to_db_time(delete_at), id, to_db_time(now)),
            )?;
            Ok(changed > 0)
        })
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM messages WHERE delete_at IS NOT NULL AND delete_at <= ?1",
                [to_db_time(now)],
            )?;
            Ok(deleted)
        })
    }

    fn get_image_blob(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.with_conn(|conn| {
            let blob: Option<Option<Vec<u8>>> = conn
                .query_row(
                    "SELECT carrier_image FROM messages WHERE id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(blob.flatten())
        })
    }

    fn supports_expiry(&self) -> bool {
        self.expiry_supported
    }
}

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    let sent_at: String = row.get(7)?;
    let delete_at: Option<String> = row.get(8)?;

    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        sender_phone: row.get(2)?,
        receiver_phone: row.get(3)?,
        display_text: row.get(4)?,
        decrypt_code: row.get(5)?,
        is_encrypted: row.get(6)?,
        sent_at: column_time(7, &sent_at)?,
        delete_at: delete_at.as_deref().map(|raw| column_time(8, raw)).transpose()?,
    })
}

fn column_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_db_time(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
