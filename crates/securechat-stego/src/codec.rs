//! Payload codec: hides a [`HiddenPayload`] in a PNG text chunk.
//!
//! The pixels are written untouched; the payload lives in a `tEXt` chunk
//! keyed [`PAYLOAD_KEY`]. Anything that re-encodes the image without carrying
//! text chunks over destroys the payload, and `decode` then rejects it.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use image::RgbImage;
use tracing::{debug, warn};

use crate::error::{RejectReason, StegoError};
use crate::payload::HiddenPayload;

pub const PAYLOAD_KEY: &str = "hidden_message";
pub const KIND_KEY: &str = "sticker_type";
pub const KIND_VALUE: &str = "encrypted_sticker";
pub const CONTENT_TYPE: &str = "image/png";

/// Embed `message` and `code` into `base` and return the PNG bytes.
pub fn encode(
    message: &str,
    code: &str,
    base: &RgbImage,
    created_at: DateTime<Utc>,
) -> Result<Vec<u8>, StegoError> {
    let encoded = HiddenPayload::new(message, code, created_at).to_side_channel()?;
    write_png(
        base,
        &[(PAYLOAD_KEY, encoded), (KIND_KEY, KIND_VALUE.to_string())],
    )
}

/// PNG without any side-channel. Used for the degraded send path.
pub fn encode_plain(base: &RgbImage) -> Result<Vec<u8>, StegoError> {
    write_png(base, &[])
}

/// Recover the message if `supplied_code` matches the embedded one.
///
/// Every failure collapses to `None`; the reason is only logged.
pub fn decode(carrier: &[u8], supplied_code: &str) -> Option<String> {
    match open(carrier, supplied_code) {
        Ok(message) => Some(message),
        Err(StegoError::Rejected(reason)) => {
            debug!("Carrier rejected: {}", reason);
            None
        }
        Err(e) => {
            warn!("Carrier decode failed: {}", e);
            None
        }
    }
}

/// Like [`decode`] but keeps the rejection reason.
pub fn open(carrier: &[u8], supplied_code: &str) -> Result<String, StegoError> {
    let encoded = read_side_channel(carrier)?;
    HiddenPayload::from_side_channel(&encoded)?.unlock(supplied_code)
}

fn write_png(img: &RgbImage, chunks: &[(&str, String)]) -> Result<Vec<u8>, StegoError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, img.width(), img.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        for (key, value) in chunks {
            encoder.add_text_chunk(key.to_string(), value.clone())?;
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(img.as_raw())?;
        writer.finish()?;
    }
    Ok(out)
}

/// Look for the payload among plain, compressed and international text
/// chunks, in that order.
fn read_side_channel(carrier: &[u8]) -> Result<String, StegoError> {
    let reader = png::Decoder::new(Cursor::new(carrier))
        .read_info()
        .map_err(|_| StegoError::Rejected(RejectReason::Malformed))?;
    let info = reader.info();

    if let Some(chunk) = info
        .uncompressed_latin1_text
        .iter()
        .find(|c| c.keyword == PAYLOAD_KEY)
    {
        return Ok(chunk.text.clone());
    }

    if let Some(chunk) = info
        .compressed_latin1_text
        .iter()
        .find(|c| c.keyword == PAYLOAD_KEY)
    {
        return chunk
            .get_text()
            .map_err(|_| StegoError::Rejected(RejectReason::BadEncoding));
    }

    if let Some(chunk) = info.utf8_text.iter().find(|c| c.keyword == PAYLOAD_KEY) {
        return chunk
            .get_text()
            .map_err(|_| StegoError::Rejected(RejectReason::BadEncoding));
    }

    Err(StegoError::Rejected(RejectReason::MissingPayload))
}
