//! # Tracking Codec
//!
//! Turns a [`TrackingPayload`] into an opaque URL-safe token and back.
//!
//! ## Token formats
//!
//! - **Plain**: base64url (unpadded) of the canonical JSON payload. Always
//!   starts with `ey` because the JSON starts with `{"`.
//! - **Encrypted**: base64url of the sealed bytes from [`crypto::seal`].
//!   Always starts with `A` because the first byte is `0x01`.
//!
//! The mode is chosen by `Configuration::encryption_key` at encode time and
//! decode must be given a configuration with the same key.
//!
//! ## Canonical form
//!
//! Payload fields serialize in a fixed order and metadata keys are sorted, so
//! the same payload always yields the same plain token.

pub mod crypto;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Configuration;
use crate::error::{DecodeError, EncodeError};
use crate::models::{Metadata, TrackingKind, TrackingPayload};

/// Serialized shape of a payload inside a token. Short keys keep URLs small.
#[derive(Debug, Serialize, Deserialize)]
struct WirePayload {
    #[serde(rename = "k")]
    kind: TrackingKind,
    #[serde(rename = "m", default)]
    metadata: Metadata,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    tracked_url: Option<String>,
    #[serde(rename = "w", default, skip_serializing_if = "Option::is_none")]
    webhook_url: Option<String>,
}

/// Encodes `payload` into a token.
///
/// # Errors
/// * `EncodeError::MissingTrackedUrl` - click payload without a destination
/// * `EncodeError::UnexpectedTrackedUrl` - open payload carrying a destination
/// * `EncodeError::UnsupportedEncoding` - configured text encoding is not UTF-8
/// * `EncodeError::Serialization` / `EncodeError::Encryption`
pub fn encode(payload: &TrackingPayload, configuration: &Configuration) -> Result<String, EncodeError> {
    check_encoding(&configuration.encoding)?;

    match (payload.kind, payload.tracked_url.as_deref()) {
        (TrackingKind::Click, None | Some("")) => return Err(EncodeError::MissingTrackedUrl),
        (TrackingKind::Open, Some(_)) => return Err(EncodeError::UnexpectedTrackedUrl),
        _ => {}
    }

    let wire = WirePayload {
        kind: payload.kind,
        metadata: payload.metadata.clone(),
        tracked_url: payload.tracked_url.clone(),
        webhook_url: payload.webhook_url.clone(),
    };
    let serialized = serde_json::to_vec(&wire).map_err(|e| EncodeError::Serialization(e.to_string()))?;

    let bytes = match &configuration.encryption_key {
        Some(key) => crypto::seal(key, &serialized)?,
        None => serialized,
    };

    let token = URL_SAFE_NO_PAD.encode(bytes);
    debug!(kind = %payload.kind, encrypted = configuration.is_encrypted(), len = token.len(), "Encoded tracking token");
    Ok(token)
}

/// Decodes a token produced by [`encode`] with the same key.
///
/// Unknown metadata values pass through untouched.
///
/// # Errors
/// * `malformed_encoding` - not unpadded base64url
/// * `decryption_failed` - wrong or missing key, or tampered bytes
/// * `invalid_payload` - bytes are not a valid payload shape
pub fn decode(token: &str, configuration: &Configuration) -> Result<TrackingPayload, DecodeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| DecodeError::malformed_encoding())?;

    let serialized = match (&configuration.encryption_key, bytes.first()) {
        (Some(key), _) => crypto::open(key, &bytes)?,
        (None, Some(&crypto::SEALED_VERSION)) => return Err(DecodeError::decryption_failed()),
        (None, _) => bytes,
    };

    let wire: WirePayload =
        serde_json::from_slice(&serialized).map_err(|_| DecodeError::invalid_payload())?;

    match (wire.kind, wire.tracked_url.as_deref()) {
        (TrackingKind::Click, None | Some("")) | (TrackingKind::Open, Some(_)) => {
            return Err(DecodeError::invalid_payload());
        }
        _ => {}
    }

    Ok(TrackingPayload {
        kind: wire.kind,
        metadata: wire.metadata,
        tracked_url: wire.tracked_url,
        webhook_url: wire.webhook_url,
    })
}

fn check_encoding(encoding: &str) -> Result<(), EncodeError> {
    match encoding.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Ok(()),
        _ => Err(EncodeError::UnsupportedEncoding(encoding.to_string())),
    }
}
