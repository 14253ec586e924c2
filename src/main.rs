use std::io::Read;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use mailtrack::{
    Configuration, ConfigurationOverrides, EncryptionKey, HtmlOptions, LinkSelector, Metadata, RequestData,
    TrackingError, TrackingKind, WebhookNotifier, adapt_html, get_pixel, resolve, tracking,
};

mod cli;

use cli::{Cli, Commands, KindArg};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let from_env = ConfigurationOverrides::from_env()?;
    let configuration = resolve(Some(&resolve(None, &from_env)), &cli.overrides.to_overrides());

    match cli.command {
        Commands::GenerateKey => {
            println!("{}", EncryptionKey::generate_secret());
        }
        Commands::OpenUrl { metadata } => {
            let metadata = parse_metadata(metadata.as_deref())?;
            let url = tracking::open_tracking_url(&metadata, &configuration)?;
            println!("{url}");
        }
        Commands::ClickUrl { url, metadata } => {
            let metadata = parse_metadata(metadata.as_deref())?;
            let url = tracking::click_tracking_url(&url, &metadata, &configuration)?;
            println!("{url}");
        }
        Commands::Decode {
            input,
            kind,
            user_ip,
            user_agent,
            referrer,
            notify,
        } => {
            let request_data = (user_ip.is_some() || user_agent.is_some() || referrer.is_some()).then(|| {
                RequestData {
                    user_ip,
                    user_agent,
                    referrer,
                }
            });
            decode(&input, kind, request_data, notify, &configuration).await?;
        }
        Commands::AdaptHtml {
            file,
            metadata,
            no_click,
            no_open,
            class,
            attribute,
        } => {
            let html = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let options = HtmlOptions {
                click_tracking: !no_click,
                open_tracking: !no_open,
                link_selector: LinkSelector { class, attribute },
            };
            let metadata = parse_metadata(metadata.as_deref())?;

            let adapted = adapt_html(&html, &configuration, &metadata, &options, None)?;
            if adapted.skipped_links > 0 {
                warn!("{} links were left untouched because their href is malformed", adapted.skipped_links);
            }
            println!("{}", adapted.html);
        }
        Commands::Pixel { output } => {
            let (bytes, mime_type) = get_pixel();
            std::fs::write(&output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {} ({} bytes) to {}", mime_type, bytes.len(), output.display());
        }
        Commands::Config => print_config(&configuration),
    }

    Ok(())
}

fn parse_metadata(raw: Option<&str>) -> Result<Metadata> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("Metadata must be a JSON object"),
        None => Ok(Metadata::new()),
    }
}

/// Accepts a full URL, a request path, or a bare token.
fn token_for(input: &str, kind: KindArg, configuration: &Configuration) -> Result<String> {
    let kinds: &[TrackingKind] = match kind {
        KindArg::Open => &[TrackingKind::Open],
        KindArg::Click => &[TrackingKind::Click],
        KindArg::Auto => &[TrackingKind::Click, TrackingKind::Open],
    };

    for candidate in kinds {
        let extracted = match candidate {
            TrackingKind::Open => tracking::open_tracking_url_path(input, configuration),
            TrackingKind::Click => tracking::click_tracking_url_path(input, configuration),
        };
        match extracted {
            Ok(token) => return Ok(token),
            Err(TrackingError::Extraction(_) | TrackingError::Config(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if input.contains('/') {
        bail!("'{input}' does not match any configured tracking base URL");
    }
    Ok(input.to_string())
}

async fn decode(
    input: &str,
    kind: KindArg,
    request_data: Option<RequestData>,
    notify: bool,
    configuration: &Configuration,
) -> Result<()> {
    let token = token_for(input, kind, configuration)?;
    let result = match kind {
        KindArg::Open => tracking::open_tracking_result(&token, configuration, request_data)?,
        KindArg::Click => tracking::click_tracking_result(&token, configuration, request_data)?,
        KindArg::Auto => tracking::tracking_result(&token, configuration, request_data)?,
    };

    let mut output = serde_json::to_value(result.to_webhook_payload())?;
    output["webhook_url"] = serde_json::json!(result.webhook_url);
    println!("{}", serde_json::to_string_pretty(&output)?);

    if notify {
        let notifier = WebhookNotifier::new(configuration);
        let delivery = notifier.send(&result).await?;
        info!("Webhook delivery: {:?}", delivery);
    }

    Ok(())
}

fn print_config(configuration: &Configuration) {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "(not set)".to_string());

    println!("Open tracking URL:        {}", show(&configuration.base_open_tracking_url));
    println!("Click tracking URL:       {}", show(&configuration.base_click_tracking_url));
    println!("Webhook URL:              {}", show(&configuration.webhook_url));
    println!("Webhook timeout:          {}s", configuration.webhook_timeout_seconds);
    println!("Embed webhook URL:        {}", configuration.include_webhook_url);
    println!("Default metadata:         {}", serde_json::json!(configuration.default_metadata));
    println!("Embed default metadata:   {}", configuration.include_default_metadata);
    println!("Encryption:               {}", if configuration.is_encrypted() { "enabled" } else { "disabled" });
    println!("Encoding:                 {}", configuration.encoding);
    println!("Trailing slash:           {}", configuration.append_slash);
}
