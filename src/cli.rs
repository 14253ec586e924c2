//! Command-line definitions for the `mailtrack` binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mailtrack::{ConfigurationOverrides, EncryptionKey};

#[derive(Parser)]
#[command(name = "mailtrack")]
#[command(about = "Generate and decode stateless email tracking URLs")]
#[command(
    long_about = "Generate and decode stateless email tracking URLs.

Configuration comes from TRACKING_* environment variables (a .env file is
loaded when present) and can be overridden per invocation with the global
flags below.

EXAMPLES:
    mailtrack open-url --metadata '{\"user_id\": \"123\"}'
    mailtrack click-url https://example.com/offer --metadata '{\"campaign\": \"spring\"}'
    mailtrack decode https://t.example/o/eyJrIjoib3BlbiJ9
    mailtrack adapt-html newsletter.html > tracked.html"
)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Per-invocation configuration overrides.
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Base URL of open tracking (pixel) URLs
    #[arg(long, global = true)]
    pub open_base_url: Option<String>,

    /// Base URL of click tracking (redirect) URLs
    #[arg(long, global = true)]
    pub click_base_url: Option<String>,

    /// Webhook notified when a tracking URL is decoded
    #[arg(long, global = true)]
    pub webhook_url: Option<String>,

    /// Embed the webhook URL inside generated tokens
    #[arg(long, global = true)]
    pub include_webhook_url: bool,

    /// Secret used to encrypt tokens
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Append a trailing slash to generated URLs
    #[arg(long, global = true)]
    pub append_slash: bool,
}

impl OverrideArgs {
    /// Flags that were actually given, as configuration overrides.
    pub fn to_overrides(&self) -> ConfigurationOverrides {
        ConfigurationOverrides {
            base_open_tracking_url: self.open_base_url.clone(),
            base_click_tracking_url: self.click_base_url.clone(),
            webhook_url: self.webhook_url.clone(),
            include_webhook_url: self.include_webhook_url.then_some(true),
            encryption_key: self.key.as_deref().map(EncryptionKey::new),
            append_slash: self.append_slash.then_some(true),
            ..ConfigurationOverrides::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a new random encryption secret
    GenerateKey,

    /// Generate an open tracking pixel URL
    OpenUrl {
        /// JSON object of metadata to embed
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Generate a click tracking URL
    ClickUrl {
        /// Destination to redirect to
        url: String,
        /// JSON object of metadata to embed
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Decode a tracking URL, request path or bare token
    Decode {
        /// Tracking URL, path, or token
        input: String,
        /// Kind of tracking URL
        #[arg(long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,
        /// Client IP to attach to the result
        #[arg(long)]
        user_ip: Option<String>,
        /// User agent to attach to the result
        #[arg(long)]
        user_agent: Option<String>,
        /// Referrer to attach to the result
        #[arg(long)]
        referrer: Option<String>,
        /// POST the result to the webhook
        #[arg(long)]
        notify: bool,
    },

    /// Add click and open tracking to an HTML email
    AdaptHtml {
        /// HTML file to read (stdin when omitted)
        file: Option<PathBuf>,
        /// JSON object of metadata to embed
        #[arg(long)]
        metadata: Option<String>,
        /// Leave links untouched
        #[arg(long)]
        no_click: bool,
        /// Do not add a tracking pixel
        #[arg(long)]
        no_open: bool,
        /// Only track links carrying this class
        #[arg(long)]
        class: Option<String>,
        /// Only track links carrying this attribute
        #[arg(long)]
        attribute: Option<String>,
    },

    /// Write the tracking pixel image to a file
    Pixel {
        /// Output path
        output: PathBuf,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Open,
    Click,
    Auto,
}
