//! # Webhook Notifier
//!
//! Fire-and-forget delivery of decoded tracking results to an HTTP endpoint.
//!
//! ## Payload
//!
//! Each notification is a JSON `POST` of [`WebhookPayload`]:
//! - `is_open_tracking` / `is_click_tracking`
//! - `tracked_url` (null for opens)
//! - `metadata`
//! - `request_data` with `user_agent`, `user_ip` and optionally `referrer`
//! - `timestamp` in Unix epoch seconds
//!
//! ## Target
//!
//! The webhook URL embedded in the token wins; otherwise the configured one
//! is used. With neither, nothing is sent.
//!
//! There is no retry. A failed delivery is logged and reported to the caller.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::Configuration;
use crate::models::{TrackingResult, WebhookPayload};

/// What happened to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The endpoint answered with a success status
    Sent,
    /// No webhook URL was known for this result
    Skipped,
    /// The endpoint answered with a non-success status
    Rejected(u16),
}

/// HTTP client for tracking webhooks.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    webhook_url: Option<String>,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Creates a notifier using the configured webhook URL and timeout.
    pub fn new(configuration: &Configuration) -> Self {
        if configuration.webhook_url.is_none() {
            warn!("No webhook URL configured - only URLs embedded in tokens will be notified");
        }

        Self {
            client: Client::new(),
            webhook_url: configuration.webhook_url.clone(),
            timeout: configuration.webhook_timeout(),
        }
    }

    /// The URL a notification for `result` would be sent to.
    pub fn target<'a>(&'a self, result: &'a TrackingResult) -> Option<&'a str> {
        result.webhook_url.as_deref().or(self.webhook_url.as_deref())
    }

    /// POSTs the webhook payload for `result`.
    ///
    /// # Errors
    /// Network failures and timeouts are propagated as `anyhow::Error`.
    pub async fn send(&self, result: &TrackingResult) -> Result<Delivery> {
        let Some(webhook_url) = self.target(result) else {
            info!("No webhook URL for {} tracking result, skipping", result.kind);
            return Ok(Delivery::Skipped);
        };

        let payload: WebhookPayload = result.to_webhook_payload();
        let response = self
            .client
            .post(webhook_url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Webhook notification sent for {} tracking", result.kind);
            Ok(Delivery::Sent)
        } else {
            error!("Failed to send webhook notification: {}", status);
            Ok(Delivery::Rejected(status.as_u16()))
        }
    }
}
