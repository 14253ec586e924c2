//! Data models for tracking payloads, decoded results and webhook bodies

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller metadata carried inside a token.
///
/// A `BTreeMap` keeps keys sorted so identical metadata always serializes to
/// identical bytes.
pub type Metadata = BTreeMap<String, Value>;

/// Discriminant between the two kinds of tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingKind {
    Open,
    Click,
}

impl fmt::Display for TrackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Click => write!(f, "click"),
        }
    }
}

/// The structured data a token represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingPayload {
    pub kind: TrackingKind,
    pub metadata: Metadata,
    /// Redirect destination; only click payloads carry one.
    pub tracked_url: Option<String>,
    /// Embedded only when the configuration asks for it.
    pub webhook_url: Option<String>,
}

impl TrackingPayload {
    pub fn open(metadata: Metadata) -> Self {
        Self {
            kind: TrackingKind::Open,
            metadata,
            tracked_url: None,
            webhook_url: None,
        }
    }

    pub fn click(tracked_url: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            kind: TrackingKind::Click,
            metadata,
            tracked_url: Some(tracked_url.into()),
            webhook_url: None,
        }
    }

    #[must_use]
    pub fn with_webhook_url(mut self, webhook_url: Option<String>) -> Self {
        self.webhook_url = webhook_url;
        self
    }

    pub fn is_open(&self) -> bool {
        self.kind == TrackingKind::Open
    }

    pub fn is_click(&self) -> bool {
        self.kind == TrackingKind::Click
    }
}

/// Request context captured by the web layer when a tracking URL is hit.
///
/// Never encoded in a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData {
    pub user_ip: Option<String>,
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// A decoded token plus the request context it was decoded in.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingResult {
    pub kind: TrackingKind,
    pub metadata: Metadata,
    pub tracked_url: Option<String>,
    pub webhook_url: Option<String>,
    pub request_data: Option<RequestData>,
    pub timestamp: DateTime<Utc>,
}

impl TrackingResult {
    pub fn is_open_tracking(&self) -> bool {
        self.kind == TrackingKind::Open
    }

    pub fn is_click_tracking(&self) -> bool {
        self.kind == TrackingKind::Click
    }

    /// Body POSTed to the webhook for this result.
    pub fn to_webhook_payload(&self) -> WebhookPayload {
        WebhookPayload {
            is_open_tracking: self.is_open_tracking(),
            is_click_tracking: self.is_click_tracking(),
            tracked_url: self.tracked_url.clone(),
            metadata: self.metadata.clone(),
            request_data: self.request_data.clone().unwrap_or_default(),
            timestamp: self.timestamp.timestamp(),
        }
    }
}

/// Webhook JSON body. Field names are part of the external contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub is_open_tracking: bool,
    pub is_click_tracking: bool,
    pub tracked_url: Option<String>,
    pub metadata: Metadata,
    pub request_data: RequestData,
    /// Unix epoch seconds.
    pub timestamp: i64,
}
