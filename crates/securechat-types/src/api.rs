use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims issued after OTP verification. The API middleware decodes
/// these and hands them to every protected handler as the caller identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub phone: String,
    pub exp: usize,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendOtpRequest {
    pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    /// Only present when the server runs in demo mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub phone_number: String,
    pub token: String,
}

// -- Contacts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddContactRequest {
    pub contact_phone: String,
    pub contact_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub phone: String,
    pub name: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_phone: String,
    pub message_text: String,
    #[serde(default)]
    pub is_encrypted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub id: Uuid,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decrypt_code: Option<String>,
}

/// One entry of a user's message feed.
///
/// `decrypt_code` is filled in only when the viewer sent the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: Uuid,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub is_encrypted: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub decrypt_code: Option<String>,
    pub auto_delete_time: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevealRequest {
    pub decrypt_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevealResponse {
    pub success: bool,
    pub message: String,
    pub show_auto_delete: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AutoDeleteResponse {
    pub success: bool,
    pub message: String,
    pub delete_time: chrono::DateTime<chrono::Utc>,
}
