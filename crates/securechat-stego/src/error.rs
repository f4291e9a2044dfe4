use thiserror::Error;

/// Why a carrier did not yield a message. Only ever logged; callers see a
/// single "rejected" outcome whatever the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Bytes are not a readable PNG.
    Malformed,
    /// No side-channel entry under the payload key.
    MissingPayload,
    /// Entry present but not base64 JSON of the expected shape.
    BadEncoding,
    /// Payload intact, supplied code differs.
    CodeMismatch,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Malformed => "malformed container",
            Self::MissingPayload => "missing payload",
            Self::BadEncoding => "undecodable payload",
            Self::CodeMismatch => "code mismatch",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum StegoError {
    #[error("No carrier image available: {0}")]
    ContainerUnavailable(String),

    #[error("Failed to embed payload: {0}")]
    EncodeFailure(String),

    #[error("Payload rejected: {0}")]
    Rejected(RejectReason),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<png::EncodingError> for StegoError {
    fn from(err: png::EncodingError) -> Self {
        StegoError::EncodeFailure(err.to_string())
    }
}
