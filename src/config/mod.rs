//! Tracking configuration and the override resolver.
//!
//! A [`Configuration`] is built once and then only read. Per-call variations
//! are expressed as a [`ConfigurationOverrides`] value and folded in with
//! [`resolve`], which never mutates its inputs.
//!
//! ## Environment
//!
//! [`ConfigurationOverrides::from_env`] reads the `TRACKING_*` variables, so
//! a `.env` file loaded through `dotenvy` works the same as a real
//! environment:
//!
//! - `TRACKING_OPEN_URL`, `TRACKING_CLICK_URL`
//! - `TRACKING_WEBHOOK_URL`, `TRACKING_WEBHOOK_TIMEOUT_SECONDS`, `TRACKING_INCLUDE_WEBHOOK_URL`
//! - `TRACKING_DEFAULT_METADATA` (JSON object), `TRACKING_INCLUDE_DEFAULT_METADATA`
//! - `TRACKING_ENCRYPTION_KEY`, `TRACKING_ENCODING`, `TRACKING_APPEND_SLASH`

use std::time::Duration;

use crate::codec::crypto::EncryptionKey;
use crate::error::ConfigError;
use crate::models::{Metadata, TrackingKind};

pub const DEFAULT_WEBHOOK_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Effective tracking configuration shared by every component.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Prefix of every open tracking (pixel) URL
    pub base_open_tracking_url: Option<String>,
    /// Prefix of every click tracking (redirect) URL
    pub base_click_tracking_url: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_timeout_seconds: u64,
    /// Embed `webhook_url` inside each token
    pub include_webhook_url: bool,
    pub default_metadata: Metadata,
    /// Embed `default_metadata` inside each token
    pub include_default_metadata: bool,
    /// Tokens are encrypted when a key is present
    pub encryption_key: Option<EncryptionKey>,
    pub encoding: String,
    /// Append a trailing slash to generated URLs
    pub append_slash: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_open_tracking_url: None,
            base_click_tracking_url: None,
            webhook_url: None,
            webhook_timeout_seconds: DEFAULT_WEBHOOK_TIMEOUT_SECONDS,
            include_webhook_url: false,
            default_metadata: Metadata::new(),
            include_default_metadata: false,
            encryption_key: None,
            encoding: DEFAULT_ENCODING.to_string(),
            append_slash: false,
        }
    }
}

impl Configuration {
    /// Base URL for the given kind of tracking.
    ///
    /// # Errors
    /// * `ConfigError::MissingBaseUrl` - the base URL for `kind` was never set
    pub fn base_url(&self, kind: TrackingKind) -> Result<&str, ConfigError> {
        let base = match kind {
            TrackingKind::Open => self.base_open_tracking_url.as_deref(),
            TrackingKind::Click => self.base_click_tracking_url.as_deref(),
        };
        base.ok_or(ConfigError::MissingBaseUrl(kind))
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_seconds)
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_key.is_some()
    }

    /// Metadata to embed in a token: defaults (when embedded) under the
    /// call-site values. Call-site keys win.
    pub fn embedded_metadata(&self, call_site: &Metadata) -> Metadata {
        let mut merged = if self.include_default_metadata {
            self.default_metadata.clone()
        } else {
            Metadata::new()
        };
        merged.extend(call_site.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Webhook URL to embed in a token, if the configuration asks for it.
    pub fn embedded_webhook_url(&self) -> Option<String> {
        if self.include_webhook_url {
            self.webhook_url.clone()
        } else {
            None
        }
    }
}

/// One optional replacement per [`Configuration`] field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationOverrides {
    pub base_open_tracking_url: Option<String>,
    pub base_click_tracking_url: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_timeout_seconds: Option<u64>,
    pub include_webhook_url: Option<bool>,
    pub default_metadata: Option<Metadata>,
    pub include_default_metadata: Option<bool>,
    pub encryption_key: Option<EncryptionKey>,
    pub encoding: Option<String>,
    pub append_slash: Option<bool>,
}

impl ConfigurationOverrides {
    /// Reads `TRACKING_*` variables from the process environment.
    ///
    /// # Errors
    /// * `ConfigError::InvalidEnv` - a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let webhook_timeout_seconds = get("TRACKING_WEBHOOK_TIMEOUT_SECONDS")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidEnv {
                    name: "TRACKING_WEBHOOK_TIMEOUT_SECONDS".to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let default_metadata = get("TRACKING_DEFAULT_METADATA")
            .map(|raw| {
                serde_json::from_str::<Metadata>(&raw).map_err(|e| ConfigError::InvalidEnv {
                    name: "TRACKING_DEFAULT_METADATA".to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            base_open_tracking_url: get("TRACKING_OPEN_URL"),
            base_click_tracking_url: get("TRACKING_CLICK_URL"),
            webhook_url: get("TRACKING_WEBHOOK_URL"),
            webhook_timeout_seconds,
            include_webhook_url: parse_flag(get("TRACKING_INCLUDE_WEBHOOK_URL"), "TRACKING_INCLUDE_WEBHOOK_URL")?,
            default_metadata,
            include_default_metadata: parse_flag(
                get("TRACKING_INCLUDE_DEFAULT_METADATA"),
                "TRACKING_INCLUDE_DEFAULT_METADATA",
            )?,
            encryption_key: get("TRACKING_ENCRYPTION_KEY").map(EncryptionKey::new),
            encoding: get("TRACKING_ENCODING"),
            append_slash: parse_flag(get("TRACKING_APPEND_SLASH"), "TRACKING_APPEND_SLASH")?,
        })
    }
}

fn parse_flag(raw: Option<String>, name: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Folds `overrides` over `base` into a new effective configuration.
///
/// Present override fields replace the base value wholesale (no deep merge of
/// `default_metadata`); absent ones fall through. Without a base the
/// documented defaults are used.
pub fn resolve(base: Option<&Configuration>, overrides: &ConfigurationOverrides) -> Configuration {
    let base = base.cloned().unwrap_or_default();
    let o = overrides.clone();

    Configuration {
        base_open_tracking_url: o.base_open_tracking_url.or(base.base_open_tracking_url),
        base_click_tracking_url: o.base_click_tracking_url.or(base.base_click_tracking_url),
        webhook_url: o.webhook_url.or(base.webhook_url),
        webhook_timeout_seconds: o.webhook_timeout_seconds.unwrap_or(base.webhook_timeout_seconds),
        include_webhook_url: o.include_webhook_url.unwrap_or(base.include_webhook_url),
        default_metadata: o.default_metadata.unwrap_or(base.default_metadata),
        include_default_metadata: o.include_default_metadata.unwrap_or(base.include_default_metadata),
        encryption_key: o.encryption_key.or(base.encryption_key),
        encoding: o.encoding.unwrap_or(base.encoding),
        append_slash: o.append_slash.unwrap_or(base.append_slash),
    }
}
