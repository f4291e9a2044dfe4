//! Sticker messages: a short text hidden in a PNG side-channel and released
//! only to holders of a per-message code.
//!
//! This is not pixel-domain steganography. The payload survives exactly as
//! long as the PNG text chunks do.

pub mod codec;
pub mod container;
pub mod draw;
pub mod error;
pub mod payload;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::warn;

pub use codec::{CONTENT_TYPE, decode, encode};
pub use container::ContainerSelector;
pub use error::{RejectReason, StegoError};
pub use payload::{HiddenPayload, generate_code};

/// Result of sealing a message into a carrier image.
#[derive(Debug)]
pub struct Sealed {
    pub image: Vec<u8>,
    /// Set when embedding failed and `image` is a bare placeholder that
    /// carries no payload.
    pub degraded: bool,
}

/// Pick a carrier, decorate it and embed `message` behind `code`.
///
/// A missing or unreadable carrier falls back to the plain placeholder
/// raster. An embedding failure falls back to the placeholder *without*
/// payload, flagged as degraded. Only a failure to write that placeholder
/// is returned as an error.
pub fn seal<R: Rng + ?Sized>(
    selector: &ContainerSelector,
    message: &str,
    code: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Sealed, StegoError> {
    let base = match selector.select(rng) {
        Ok(img) => container::perturb(&container::fit_canvas(img), rng),
        Err(e) => {
            warn!("Container unavailable, using placeholder: {}", e);
            container::placeholder()
        }
    };

    match codec::encode(message, code, &base, now) {
        Ok(image) => Ok(Sealed { image, degraded: false }),
        Err(e) => {
            warn!("Embedding failed, sending placeholder without payload: {}", e);
            let image = codec::encode_plain(&container::placeholder())?;
            Ok(Sealed { image, degraded: true })
        }
    }
}
