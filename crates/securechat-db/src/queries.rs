use crate::models::{ContactRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Store a fresh OTP hash for `phone`, creating the user on first contact.
    /// An existing user keeps its id but goes back to unverified.
    /// Returns the id of the user row.
    pub fn upsert_user_otp(&self, new_id: &str, phone: &str, otp_hash: &str) -> Result<String> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, phone_number, otp_hash, is_verified) VALUES (?1, ?2, ?3, 0)
                 ON CONFLICT(phone_number) DO UPDATE SET otp_hash = excluded.otp_hash, is_verified = 0",
                (new_id, phone, otp_hash),
            )?;
            let id = conn.query_row(
                "SELECT id FROM users WHERE phone_number = ?1",
                [phone],
                |row| row.get(0),
            )?;
            Ok(id)
        })
    }

    pub fn get_user_by_phone(&self, phone: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_phone(conn, phone))
    }

    /// Mark the user verified and burn the OTP so it cannot be replayed.
    pub fn mark_verified(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET is_verified = 1, otp_hash = NULL WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    // -- Contacts --

    pub fn add_contact(&self, id: &str, user_id: &str, phone: &str, name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO contacts (id, user_id, contact_phone, contact_name) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, phone, name),
            )?;
            Ok(())
        })
    }

    pub fn get_contacts(&self, user_id: &str) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, contact_phone, contact_name, status
                 FROM contacts WHERE user_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ContactRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        contact_phone: row.get(2)?,
                        contact_name: row.get(3)?,
                        status: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_phone(conn: &Connection, phone: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, phone_number, otp_hash, is_verified, created_at FROM users WHERE phone_number = ?1",
    )?;

    let row = stmt
        .query_row([phone], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                phone_number: row.get(1)?,
                otp_hash: row.get(2)?,
                is_verified: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
