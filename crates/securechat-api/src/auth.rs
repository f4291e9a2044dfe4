use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use chrono::TimeDelta;
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use securechat_db::Database;
use securechat_stego::ContainerSelector;
use securechat_types::api::{
    Claims, SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse,
};

use crate::error::{AppError, Result, blocking};

pub const OTP_LEN: usize = 6;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub stickers: ContainerSelector,
    /// How long a message survives after deletion is armed.
    pub auto_delete: TimeDelta,
    /// Demo mode: echo the OTP back instead of texting it.
    pub expose_otp: bool,
}

pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>> {
    let phone = req.phone_number.trim().to_string();
    if phone.is_empty() {
        return Err(AppError::BadRequest("Phone number required".into()));
    }

    let otp = generate_otp(&mut rand::rng());

    let db = state.clone();
    let (p, o) = (phone.clone(), otp.clone());
    blocking(move || {
        let hash = hash_otp(&o)?;
        db.db.upsert_user_otp(&Uuid::new_v4().to_string(), &p, &hash)?;
        Ok(())
    })
    .await?;

    // Delivery is out of scope; the code is only ever logged or echoed.
    info!("OTP issued for {}", phone);

    Ok(Json(SendOtpResponse {
        success: true,
        message: format!("OTP sent to {}", phone),
        otp: state.expose_otp.then_some(otp),
    }))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>> {
    let phone = req.phone_number.trim().to_string();
    let otp = req.otp.trim().to_string();
    if phone.is_empty() || otp.is_empty() {
        return Err(AppError::BadRequest("Phone number and OTP required".into()));
    }

    let db = state.clone();
    let p = phone.clone();
    let user_id = blocking(move || {
        let invalid = || AppError::Unauthorized("Invalid OTP".into());

        let user = db.db.get_user_by_phone(&p)?.ok_or_else(invalid)?;
        let stored = user.otp_hash.as_deref().ok_or_else(invalid)?;
        let parsed = PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("corrupt OTP hash: {}", e))?;
        Argon2::default()
            .verify_password(otp.as_bytes(), &parsed)
            .map_err(|_| invalid())?;

        db.db.mark_verified(&user.id)?;
        Ok(user.id)
    })
    .await?;

    let user_id: Uuid = user_id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user_id, e))?;
    let token = create_token(&state.jwt_secret, user_id, &phone)?;

    info!("User {} logged in", phone);

    Ok(Json(VerifyOtpResponse {
        success: true,
        user_id,
        phone_number: phone,
        token,
    }))
}

/// Six decimal digits for phone login.
pub fn generate_otp<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..OTP_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

fn hash_otp(otp: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(otp.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("OTP hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn create_token(secret: &str, user_id: Uuid, phone: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        phone: phone.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
