use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::error::{RejectReason, StegoError};

pub const CODE_LEN: usize = 8;

/// What gets hidden inside a carrier image. Immutable once embedded.
///
/// Field names on the wire are `message`, `decrypt_code` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenPayload {
    pub message: String,
    #[serde(rename = "decrypt_code")]
    pub code: String,
    /// Audit only, never used for expiry.
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl HiddenPayload {
    pub fn new(message: &str, code: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            message: message.to_string(),
            code: code.to_string(),
            created_at,
        }
    }

    /// JSON, then base64 so the result is plain ASCII for a Latin-1 text chunk.
    pub fn to_side_channel(&self) -> Result<String, StegoError> {
        let json = serde_json::to_vec(self).map_err(|e| StegoError::EncodeFailure(e.to_string()))?;
        Ok(B64.encode(json))
    }

    pub fn from_side_channel(encoded: &str) -> Result<Self, StegoError> {
        let json = B64
            .decode(encoded.trim())
            .map_err(|_| StegoError::Rejected(RejectReason::BadEncoding))?;
        serde_json::from_slice(&json).map_err(|_| StegoError::Rejected(RejectReason::BadEncoding))
    }

    /// Exact, case-sensitive comparison.
    pub fn unlock(self, supplied_code: &str) -> Result<String, StegoError> {
        if self.code == supplied_code {
            Ok(self.message)
        } else {
            Err(StegoError::Rejected(RejectReason::CodeMismatch))
        }
    }
}

/// Fresh 8-character alphanumeric reveal code, independent of the message.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| char::from(rng.sample::<u8, _>(Alphanumeric)))
        .collect()
}
