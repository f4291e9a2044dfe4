use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use securechat_db::MessageStore;
use securechat_db::models::{MessageRow, NewMessage};
use securechat_stego::{CONTENT_TYPE, generate_code, seal};
use securechat_types::api::{
    AutoDeleteResponse, Claims, MessageView, RevealRequest, RevealResponse, SendMessageRequest,
    SendMessageResponse,
};

use crate::auth::AppState;
use crate::error::{AppError, Result, blocking};
use crate::{expiry, reveal};

pub const ENCRYPTED_PLACEHOLDER: &str = "🎨 [Encrypted Sticker Message]";

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    let receiver = req.receiver_phone.trim().to_string();
    if receiver.is_empty() || req.message_text.is_empty() {
        return Err(AppError::BadRequest(
            "Receiver phone and message text required".into(),
        ));
    }

    let db = state.clone();
    let sender_id = claims.sub.to_string();
    let is_encrypted = req.is_encrypted;
    let text = req.message_text;

    // Image work is CPU-bound, keep it with the insert off the runtime.
    let (id, code) = blocking(move || {
        let now = Utc::now();
        let mut msg = NewMessage {
            sender_id,
            receiver_phone: receiver,
            display_text: text,
            carrier_image: None,
            decrypt_code: None,
            is_encrypted,
            sent_at: now,
        };

        if is_encrypted {
            let mut rng = rand::rng();
            let code = generate_code(&mut rng);
            let sealed = seal(&db.stickers, &msg.display_text, &code, now, &mut rng)?;
            if sealed.degraded {
                warn!("Sending sticker without hidden payload");
            }
            msg.carrier_image = Some(sealed.image);
            msg.decrypt_code = Some(code);
            msg.display_text = ENCRYPTED_PLACEHOLDER.to_string();
        }

        let id = db.db.insert_message(&msg)?;
        Ok((id, msg.decrypt_code))
    })
    .await?;

    info!(
        "Message {} sent by {} (encrypted: {})",
        id, claims.phone, is_encrypted
    );

    let id: Uuid = id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt message id '{}': {}", id, e))?;
    let message = if code.is_some() {
        "Encrypted sticker message sent! Share the decrypt code with recipient."
    } else {
        "Message sent successfully"
    };

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            id,
            message: message.into(),
            decrypt_code: code,
        }),
    ))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MessageView>>> {
    let db = state.clone();
    let phone = claims.phone.clone();
    let rows = blocking(move || expiry::visible_messages(&db.db, &phone, Utc::now())).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| view_for(row, &claims.phone))
            .collect(),
    ))
}

pub async fn get_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let db = state.clone();
    let blob = blocking(move || {
        let id = message_id.to_string();
        ensure_participant(&db.db, &id, &claims.phone, Utc::now())?;
        db.db.get_image_blob(&id)?.ok_or(AppError::NotFound)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], blob))
}

pub async fn reveal_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<RevealRequest>,
) -> Result<Json<RevealResponse>> {
    if req.decrypt_code.is_empty() {
        return Err(AppError::BadRequest("Decrypt code required".into()));
    }

    let db = state.clone();
    let revealed = blocking(move || {
        let id = message_id.to_string();
        let now = Utc::now();
        ensure_participant(&db.db, &id, &claims.phone, now)?;
        reveal::reveal(&db.db, &id, &req.decrypt_code, now)
    })
    .await?;

    Ok(Json(RevealResponse {
        success: true,
        message: revealed.text,
        show_auto_delete: revealed.can_arm,
    }))
}

pub async fn set_auto_delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<Uuid>,
) -> Result<Json<AutoDeleteResponse>> {
    let db = state.clone();
    let delay = state.auto_delete;
    let delete_time = blocking(move || {
        let id = message_id.to_string();
        let now = Utc::now();
        ensure_participant(&db.db, &id, &claims.phone, now)?;
        expiry::arm(&db.db, &id, now, delay)
    })
    .await?;

    Ok(Json(AutoDeleteResponse {
        success: true,
        message: format!(
            "Message will be auto-deleted in {} seconds",
            delay.num_seconds()
        ),
        delete_time,
    }))
}

/// Only the sender and the receiver may touch a message. Anyone else gets
/// the same answer as for an unknown id, and so does everyone once the
/// deadline has passed, swept or not.
fn ensure_participant<S: MessageStore + ?Sized>(
    store: &S,
    message_id: &str,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<MessageRow> {
    let row = store.get_message(message_id)?.ok_or(AppError::NotFound)?;
    if row.is_expired(now) {
        return Err(AppError::NotFound);
    }
    if row.sender_phone != phone && row.receiver_phone != phone {
        return Err(AppError::NotFound);
    }
    Ok(row)
}

/// Shape a row for `viewer`. The decrypt code is shown to the sender only.
pub fn view_for(row: MessageRow, viewer_phone: &str) -> MessageView {
    let decrypt_code = if row.sender_phone == viewer_phone {
        row.decrypt_code
    } else {
        None
    };

    MessageView {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt message id '{}': {}", row.id, e);
            Uuid::default()
        }),
        sender: row.sender_phone,
        receiver: row.receiver_phone,
        message: row.display_text,
        is_encrypted: row.is_encrypted,
        timestamp: row.sent_at,
        decrypt_code,
        auto_delete_time: row.delete_at,
    }
}
