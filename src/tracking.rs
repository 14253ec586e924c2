//! High-level tracking API.
//!
//! Ties the configuration, codec and URL builder together: generate open
//! and click URLs, pull the token out of an inbound request path, and decode
//! it into a [`TrackingResult`].

use chrono::Utc;
use tracing::debug;

use crate::codec;
use crate::config::Configuration;
use crate::error::{DecodeError, Result};
use crate::models::{Metadata, RequestData, TrackingKind, TrackingPayload, TrackingResult};
use crate::url_builder;

/// Pixel URL for an email open.
///
/// # Errors
/// * `ConfigError::MissingBaseUrl` - no open tracking base URL
/// * `EncodeError` - the payload could not be encoded
pub fn open_tracking_url(metadata: &Metadata, configuration: &Configuration) -> Result<String> {
    let payload = TrackingPayload::open(configuration.embedded_metadata(metadata))
        .with_webhook_url(configuration.embedded_webhook_url());
    tracking_url(&payload, configuration)
}

/// Redirect URL for a click on `url`.
///
/// # Errors
/// * `ConfigError::MissingBaseUrl` - no click tracking base URL
/// * `EncodeError` - the payload could not be encoded
pub fn click_tracking_url(url: &str, metadata: &Metadata, configuration: &Configuration) -> Result<String> {
    let payload = TrackingPayload::click(url, configuration.embedded_metadata(metadata))
        .with_webhook_url(configuration.embedded_webhook_url());
    tracking_url(&payload, configuration)
}

fn tracking_url(payload: &TrackingPayload, configuration: &Configuration) -> Result<String> {
    let base_url = configuration.base_url(payload.kind)?;
    let token = codec::encode(payload, configuration)?;
    Ok(url_builder::build(base_url, &token, configuration.append_slash))
}

/// Token part of an open tracking URL or request path.
pub fn open_tracking_url_path(url: &str, configuration: &Configuration) -> Result<String> {
    let base_url = configuration.base_url(TrackingKind::Open)?;
    Ok(url_builder::extract_token(url, base_url)?)
}

/// Token part of a click tracking URL or request path.
pub fn click_tracking_url_path(url: &str, configuration: &Configuration) -> Result<String> {
    let base_url = configuration.base_url(TrackingKind::Click)?;
    Ok(url_builder::extract_token(url, base_url)?)
}

/// Decodes an open tracking token.
///
/// # Errors
/// * `DecodeError` - bad token, or a click token
pub fn open_tracking_result(
    token: &str,
    configuration: &Configuration,
    request_data: Option<RequestData>,
) -> Result<TrackingResult> {
    expect_kind(tracking_result(token, configuration, request_data)?, TrackingKind::Open)
}

/// Decodes a click tracking token.
///
/// # Errors
/// * `DecodeError` - bad token, or an open token
pub fn click_tracking_result(
    token: &str,
    configuration: &Configuration,
    request_data: Option<RequestData>,
) -> Result<TrackingResult> {
    expect_kind(tracking_result(token, configuration, request_data)?, TrackingKind::Click)
}

/// Decodes a token of either kind.
///
/// Values the token does not carry fall back to the decoding configuration:
/// the webhook URL, and the default metadata when it was not embedded
/// (token keys win).
pub fn tracking_result(
    token: &str,
    configuration: &Configuration,
    request_data: Option<RequestData>,
) -> Result<TrackingResult> {
    let payload = codec::decode(token, configuration)?;

    let metadata = if configuration.include_default_metadata {
        payload.metadata
    } else {
        let mut merged = configuration.default_metadata.clone();
        merged.extend(payload.metadata);
        merged
    };

    debug!(kind = %payload.kind, "Decoded tracking token");

    Ok(TrackingResult {
        kind: payload.kind,
        metadata,
        tracked_url: payload.tracked_url,
        webhook_url: payload.webhook_url.or_else(|| configuration.webhook_url.clone()),
        request_data,
        timestamp: Utc::now(),
    })
}

fn expect_kind(result: TrackingResult, kind: TrackingKind) -> Result<TrackingResult> {
    if result.kind == kind {
        Ok(result)
    } else {
        Err(DecodeError::invalid_payload().into())
    }
}
