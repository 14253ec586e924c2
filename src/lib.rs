//! Stateless open and click tracking for email.
//!
//! Metadata, an optional destination URL and an optional webhook URL are
//! encoded into a self-contained token carried in the tracking URL itself,
//! optionally encrypted. Decoding the token later needs nothing but the same
//! [`Configuration`].
//!
//! ```no_run
//! use mailtrack::{Configuration, Metadata, tracking};
//!
//! let config = Configuration {
//!     base_open_tracking_url: Some("https://t.example/o/".to_string()),
//!     ..Configuration::default()
//! };
//! let mut metadata = Metadata::new();
//! metadata.insert("user_id".to_string(), "123".into());
//!
//! let url = tracking::open_tracking_url(&metadata, &config)?;
//! let token = tracking::open_tracking_url_path(&url, &config)?;
//! let result = tracking::open_tracking_result(&token, &config, None)?;
//! assert_eq!(result.metadata, metadata);
//! # Ok::<(), mailtrack::TrackingError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod html;
pub mod models;
pub mod pixel;
pub mod tracking;
pub mod traits;
pub mod url_builder;
pub mod webhook;

pub use codec::crypto::EncryptionKey;
pub use config::{Configuration, ConfigurationOverrides, resolve};
pub use error::{
    ConfigError, DecodeError, DecodeFailure, EncodeError, ExtractionError, ParseError, TrackingError,
};
pub use html::{AdaptedHtml, HtmlOptions, LinkSelector, adapt_html};
pub use models::{Metadata, RequestData, TrackingKind, TrackingPayload, TrackingResult, WebhookPayload};
pub use pixel::get_pixel;
pub use traits::LinkProcessor;
pub use webhook::{Delivery, WebhookNotifier};
