//! Error kinds raised by the tracking core.
//!
//! Every failure is reported synchronously to the caller and nothing is
//! retried here. Web handlers are expected to treat any decode or extraction
//! failure as "not a tracking request".

use std::fmt;

use thiserror::Error;

use crate::models::TrackingKind;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Umbrella error for the high-level tracking API.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Configuration problems detected when a capability is used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} tracking base URL is not configured")]
    MissingBaseUrl(TrackingKind),

    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: String, reason: String },
}

/// Raised by `codec::encode`; no partial token is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("click tracking payload has no tracked URL")]
    MissingTrackedUrl,

    #[error("open tracking payload must not carry a tracked URL")]
    UnexpectedTrackedUrl,

    #[error("unsupported text encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("payload could not be serialized: {0}")]
    Serialization(String),

    #[error("payload could not be encrypted")]
    Encryption,
}

/// Why a token could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The token is not valid unpadded base64url.
    MalformedEncoding,
    /// Wrong key, missing key, or tampered ciphertext. Deliberately opaque.
    DecryptionFailed,
    /// The decoded bytes are not a valid payload.
    InvalidPayload,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEncoding => write!(f, "malformed_encoding"),
            Self::DecryptionFailed => write!(f, "decryption_failed"),
            Self::InvalidPayload => write!(f, "invalid_payload"),
        }
    }
}

/// Raised by `codec::decode`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tracking token could not be decoded: {reason}")]
pub struct DecodeError {
    pub reason: DecodeFailure,
}

impl DecodeError {
    pub const fn malformed_encoding() -> Self {
        Self { reason: DecodeFailure::MalformedEncoding }
    }

    pub const fn decryption_failed() -> Self {
        Self { reason: DecodeFailure::DecryptionFailed }
    }

    pub const fn invalid_payload() -> Self {
        Self { reason: DecodeFailure::InvalidPayload }
    }
}

/// The request path or URL does not belong to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a tracking URL under '{base_url}'")]
pub struct ExtractionError {
    pub input: String,
    pub base_url: String,
}

/// The HTML document cannot carry tracking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTML could not be processed: {reason}")]
pub struct ParseError {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_messages_use_reason_names() {
        assert_eq!(
            DecodeError::decryption_failed().to_string(),
            "tracking token could not be decoded: decryption_failed"
        );
        assert_eq!(
            DecodeError::malformed_encoding().to_string(),
            "tracking token could not be decoded: malformed_encoding"
        );
    }

    #[test]
    fn missing_base_url_names_the_kind() {
        let err = ConfigError::MissingBaseUrl(TrackingKind::Click);
        assert_eq!(err.to_string(), "click tracking base URL is not configured");
    }
}
