//! # Email Content Transformer
//!
//! Rewrites an HTML email body so that every eligible link goes through the
//! click tracking endpoint and an invisible open tracking pixel is appended
//! to `<body>`.
//!
//! The document is parsed into `scraper`'s node arena. Node ids of the
//! anchors to rewrite are collected first, then each node value is swapped
//! in place, so untouched nodes keep their position and content. The
//! transformation is repeatable: links that already point at a tracking
//! endpoint are left alone and a second pixel is never added.

pub mod selector;

use reqwest::Url;
use scraper::{Html, Node, Selector};
use tracing::{info, warn};

use crate::config::Configuration;
use crate::error::{ParseError, Result};
use crate::models::{Metadata, TrackingKind};
use crate::traits::LinkProcessor;
use crate::tracking;
use crate::url_builder::with_trailing_slash;

pub use selector::{LinkSelector, is_trackable_href};

/// Marker attribute identifying a pixel added by [`adapt_html`].
pub const PIXEL_MARKER_ATTRIBUTE: &str = "data-mailtrack-pixel";

const PIXEL_STYLE: &str = "display:none;width:1px;height:1px;border:0;";

/// What to do to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    pub click_tracking: bool,
    pub open_tracking: bool,
    pub link_selector: LinkSelector,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            click_tracking: true,
            open_tracking: true,
            link_selector: LinkSelector::all(),
        }
    }
}

/// Transformed document plus counters for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedHtml {
    pub html: String,
    /// Links rewritten to a click tracking URL
    pub tracked_links: usize,
    /// Eligible links left untouched because their href was malformed
    pub skipped_links: usize,
    pub pixel_added: bool,
}

/// Adds click and open tracking to an HTML email.
///
/// A malformed `href` does not abort the document: the link is left as-is
/// and counted in [`AdaptedHtml::skipped_links`].
///
/// # Arguments
/// * `html` - The email body
/// * `configuration` - Effective tracking configuration
/// * `metadata` - Document-level metadata, encoded into the pixel and every link
/// * `options` - Which halves to apply and which links are eligible
/// * `link_processor` - Optional per-link metadata enrichment
///
/// # Errors
/// * `ParseError` - no `<body>` to host the pixel
/// * `ConfigError::MissingBaseUrl` - a requested half has no base URL
/// * `EncodeError` - the pixel payload could not be encoded
pub fn adapt_html(
    html: &str,
    configuration: &Configuration,
    metadata: &Metadata,
    options: &HtmlOptions,
    link_processor: Option<&dyn LinkProcessor>,
) -> Result<AdaptedHtml> {
    let mut document = Html::parse_document(html);

    let body_selector = Selector::parse("body").map_err(|e| ParseError {
        reason: format!("{e:?}"),
    })?;
    let body_id = document.select(&body_selector).next().map(|body| body.id());

    let pixel_url = if options.open_tracking {
        if body_id.is_none() {
            return Err(ParseError {
                reason: "document has no <body> element".to_string(),
            }
            .into());
        }
        Some(tracking::open_tracking_url(metadata, configuration)?)
    } else {
        None
    };

    let mut tracked_links = 0;
    let mut skipped_links = 0;

    if options.click_tracking {
        configuration.base_url(TrackingKind::Click)?;
        let candidates = LinkSelector::candidates()?;

        let targets: Vec<_> = document
            .select(&candidates)
            .filter(|anchor| options.link_selector.matches(anchor.value()))
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim().to_string();
                if !is_trackable_href(&href, configuration) {
                    return None;
                }
                let attrs: Vec<(String, String)> = anchor
                    .value()
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect();
                Some((anchor.id(), href, attrs))
            })
            .collect();

        for (id, href, attrs) in targets {
            match tracked_anchor(&href, &attrs, configuration, metadata, link_processor) {
                Some(node) => {
                    if let Some(mut anchor) = document.tree.get_mut(id) {
                        *anchor.value() = node;
                        tracked_links += 1;
                    }
                }
                None => {
                    warn!("Skipping malformed link: {}", href);
                    skipped_links += 1;
                }
            }
        }
    }

    let mut pixel_added = false;
    if let (Some(pixel_url), Some(body_id)) = (pixel_url, body_id)
        && !has_pixel(&document, configuration)
    {
        let pixel = pixel_node(&pixel_url).ok_or_else(|| ParseError {
            reason: "tracking pixel element could not be built".to_string(),
        })?;
        if let Some(mut body) = document.tree.get_mut(body_id) {
            body.append(pixel);
            pixel_added = true;
        }
    }

    info!(
        "Adapted HTML: {} links tracked, {} skipped, pixel added: {}",
        tracked_links, skipped_links, pixel_added
    );

    Ok(AdaptedHtml {
        html: document.html(),
        tracked_links,
        skipped_links,
        pixel_added,
    })
}

/// Builds the replacement anchor node, or `None` when the link must be skipped.
fn tracked_anchor(
    href: &str,
    attrs: &[(String, String)],
    configuration: &Configuration,
    metadata: &Metadata,
    link_processor: Option<&dyn LinkProcessor>,
) -> Option<Node> {
    let parsed = Url::parse(href).ok()?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return None;
    }

    let link_metadata = match link_processor {
        Some(processor) => processor.process(href, metadata.clone()),
        None => metadata.clone(),
    };

    let tracked_url = match tracking::click_tracking_url(href, &link_metadata, configuration) {
        Ok(url) => url,
        Err(e) => {
            warn!("Could not encode link {}: {}", href, e);
            return None;
        }
    };

    let attrs: Vec<(String, String)> = attrs
        .iter()
        .map(|(name, value)| {
            if name == "href" {
                (name.clone(), tracked_url.clone())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect();

    element_node("a", &attrs)
}

fn pixel_node(src: &str) -> Option<Node> {
    let attrs = [
        ("src", src),
        ("width", "1"),
        ("height", "1"),
        ("alt", ""),
        ("style", PIXEL_STYLE),
        (PIXEL_MARKER_ATTRIBUTE, "1"),
    ]
    .map(|(name, value)| (name.to_string(), value.to_string()));
    element_node("img", &attrs)
}

/// Whether an earlier pass already added an open tracking pixel.
fn has_pixel(document: &Html, configuration: &Configuration) -> bool {
    let Ok(images) = Selector::parse("img") else {
        return false;
    };
    let open_prefix = configuration
        .base_open_tracking_url
        .as_deref()
        .filter(|base| !base.is_empty())
        .map(with_trailing_slash);

    document.select(&images).any(|img| {
        img.value().attr(PIXEL_MARKER_ATTRIBUTE).is_some()
            || matches!((img.value().attr("src"), &open_prefix), (Some(src), Some(prefix)) if src.starts_with(prefix.as_str()))
    })
}

/// Parses a single element from markup and returns its node value.
///
/// Children are not included; the caller keeps the existing subtree.
fn element_node(tag: &str, attrs: &[(String, String)]) -> Option<Node> {
    let mut markup = format!("<{tag}");
    for (name, value) in attrs {
        markup.push_str(&format!(" {name}=\"{}\"", escape_attribute(value)));
    }
    markup.push('>');
    if tag != "img" {
        markup.push_str(&format!("</{tag}>"));
    }

    let fragment = Html::parse_fragment(&markup);
    let selector = Selector::parse(tag).ok()?;
    let element = fragment.select(&selector).next()?.value().clone();
    Some(Node::Element(element))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_attribute_handles_quotes_and_ampersands() {
        assert_eq!(
            escape_attribute(r#"https://x.example/?a=1&b="2""#),
            "https://x.example/?a=1&amp;b=&quot;2&quot;"
        );
    }

    #[test]
    fn element_node_keeps_attribute_values() {
        let attrs = vec![
            ("href".to_string(), "https://x.example/?a=1&b=2".to_string()),
            ("class".to_string(), "cta".to_string()),
        ];
        let Some(Node::Element(element)) = element_node("a", &attrs) else {
            panic!("expected an element");
        };
        assert_eq!(element.name(), "a");
        assert_eq!(element.attr("href"), Some("https://x.example/?a=1&b=2"));
        assert_eq!(element.attr("class"), Some("cta"));
    }

    #[test]
    fn pixel_node_carries_marker() {
        let Some(Node::Element(element)) = pixel_node("https://t.example/o/eyJ") else {
            panic!("expected an element");
        };
        assert_eq!(element.name(), "img");
        assert_eq!(element.attr("src"), Some("https://t.example/o/eyJ"));
        assert_eq!(element.attr(PIXEL_MARKER_ATTRIBUTE), Some("1"));
        assert_eq!(element.attr("width"), Some("1"));
    }
}
