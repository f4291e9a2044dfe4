use chrono::{DateTime, Utc};
use tracing::debug;

use securechat_db::MessageStore;

use crate::error::{AppError, Result};

/// Plaintext released by a successful reveal.
#[derive(Debug, PartialEq, Eq)]
pub struct Revealed {
    pub text: String,
    /// The reader may now arm deletion. Revealing never arms it by itself.
    pub can_arm: bool,
}

/// Check `supplied_code` against the message's carrier and release the text
/// on a match. Pure read: the record is never modified.
///
/// Unknown ids, messages past their deadline and messages without a carrier
/// are `NotFound`; every decode failure, including a wrong code, is
/// `InvalidCode`.
pub fn reveal<S: MessageStore + ?Sized>(
    store: &S,
    message_id: &str,
    supplied_code: &str,
    now: DateTime<Utc>,
) -> Result<Revealed> {
    let row = store.get_message(message_id)?.ok_or(AppError::NotFound)?;
    if row.is_expired(now) {
        return Err(AppError::NotFound);
    }

    let carrier = store.get_image_blob(message_id)?.ok_or(AppError::NotFound)?;

    match securechat_stego::decode(&carrier, supplied_code) {
        Some(text) => Ok(Revealed { text, can_arm: true }),
        None => {
            debug!("Reveal rejected for message {}", message_id);
            Err(AppError::InvalidCode)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use securechat_db::Database;
    use securechat_db::models::NewMessage;
    use securechat_stego::ContainerSelector;

    fn store_sealed(db: &Database, text: &str, code: &str) -> String {
        db.upsert_user_otp("u-sender", "111", "h").unwrap();
        let dir = std::env::temp_dir().join(format!("securechat_reveal_{}", uuid::Uuid::new_v4()));
        let sealed = securechat_stego::seal(
            &ContainerSelector::new(&dir),
            text,
            code,
            Utc::now(),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        db.insert_message(&NewMessage {
            sender_id: "u-sender".into(),
            receiver_phone: "222".into(),
            display_text: "[Encrypted]".into(),
            carrier_image: Some(sealed.image),
            decrypt_code: Some(code.into()),
            is_encrypted: true,
            sent_at: Utc::now(),
        })
        .unwrap()
    }

    #[test]
    fn wrong_code_then_right_code() {
        let db = Database::open_in_memory().unwrap();
        let id = store_sealed(&db, "meet at 9", "K3x9Qp2a");

        assert!(matches!(reveal(&db, &id, "0000", Utc::now()), Err(AppError::InvalidCode)));
        assert_eq!(
            reveal(&db, &id, "K3x9Qp2a", Utc::now()).unwrap(),
            Revealed { text: "meet at 9".into(), can_arm: true }
        );
    }

    #[test]
    fn reveal_is_repeatable_and_does_not_arm() {
        let db = Database::open_in_memory().unwrap();
        let id = store_sealed(&db, "again", "Ab12Cd34");

        for _ in 0..3 {
            assert_eq!(reveal(&db, &id, "Ab12Cd34", Utc::now()).unwrap().text, "again");
        }
        assert!(db.get_message(&id).unwrap().unwrap().delete_at.is_none());
    }

    #[test]
    fn unknown_or_plain_message_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_user_otp("u-sender", "111", "h").unwrap();
        let plain = db
            .insert_message(&NewMessage {
                sender_id: "u-sender".into(),
                receiver_phone: "222".into(),
                display_text: "hello".into(),
                carrier_image: None,
                decrypt_code: None,
                is_encrypted: false,
                sent_at: Utc::now(),
            })
            .unwrap();

        assert!(matches!(reveal(&db, "nope", "x", Utc::now()), Err(AppError::NotFound)));
        assert!(matches!(reveal(&db, &plain, "x", Utc::now()), Err(AppError::NotFound)));
    }

    #[test]
    fn expired_but_unswept_message_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = store_sealed(&db, "burn", "Ab12Cd34");
        let now = Utc::now();
        assert!(db.update_delete_at(&id, now + TimeDelta::seconds(15), now).unwrap());

        let later = now + TimeDelta::seconds(60);
        assert!(db.get_message(&id).unwrap().is_some());
        assert!(matches!(
            reveal(&db, &id, "Ab12Cd34", later),
            Err(AppError::NotFound)
        ));
        assert_eq!(
            reveal(&db, &id, "Ab12Cd34", now + TimeDelta::seconds(14)).unwrap().text,
            "burn"
        );
    }
}
