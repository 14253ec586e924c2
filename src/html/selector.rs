//! Link selection policy for the HTML transformer

use scraper::Selector;
use scraper::node::Element;

use crate::config::Configuration;
use crate::error::ParseError;
use crate::url_builder::is_tracking_url;

/// Which anchors are eligible for click tracking.
///
/// With neither field set every `<a href>` is eligible. Otherwise an anchor
/// must carry the class OR the boolean attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSelector {
    /// CSS class token, e.g. `track`
    pub class: Option<String>,
    /// Custom attribute name, e.g. `data-track`
    pub attribute: Option<String>,
}

impl LinkSelector {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            attribute: None,
        }
    }

    pub fn with_attribute(attribute: impl Into<String>) -> Self {
        Self {
            class: None,
            attribute: Some(attribute.into()),
        }
    }

    /// Whether an anchor element satisfies this policy.
    ///
    /// Class and attribute are compared as plain tokens, so names that are
    /// not valid CSS identifiers (e.g. `2col`) still match.
    pub fn matches(&self, element: &Element) -> bool {
        if element.name() != "a" || element.attr("href").is_none() {
            return false;
        }
        match (&self.class, &self.attribute) {
            (None, None) => true,
            (class, attribute) => {
                class.as_deref().is_some_and(|class| element.classes().any(|c| c == class))
                    || attribute.as_deref().is_some_and(|attribute| element.attr(attribute).is_some())
            }
        }
    }

    /// Selector for every candidate anchor; [`LinkSelector::matches`] narrows it.
    pub fn candidates() -> Result<Selector, ParseError> {
        Selector::parse("a[href]").map_err(|e| ParseError {
            reason: format!("invalid link selector: {e:?}"),
        })
    }
}

/// Default href predicate: absolute http(s) links that are not already
/// tracking links. `javascript:`, `mailto:`, `tel:` and relative links are
/// left alone.
pub fn is_trackable_href(href: &str, configuration: &Configuration) -> bool {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")) && !is_tracking_url(href, configuration)
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn anchor(markup: &str) -> Element {
        let fragment = Html::parse_fragment(markup);
        let selector = Selector::parse("a").unwrap();
        fragment.select(&selector).next().unwrap().value().clone()
    }

    #[test]
    fn default_policy_takes_every_linked_anchor() {
        assert!(LinkSelector::all().matches(&anchor(r#"<a href="https://x.example">x</a>"#)));
        assert!(!LinkSelector::all().matches(&anchor(r#"<a name="top">x</a>"#)));
    }

    #[test]
    fn class_or_attribute_policy() {
        let both = LinkSelector {
            class: Some("track".to_string()),
            attribute: Some("data-track".to_string()),
        };
        assert!(both.matches(&anchor(r#"<a class="cta track" href="https://x.example">x</a>"#)));
        assert!(both.matches(&anchor(r#"<a data-track href="https://x.example">x</a>"#)));
        assert!(!both.matches(&anchor(r#"<a class="tracker" href="https://x.example">x</a>"#)));
    }

    #[test]
    fn class_that_is_not_a_css_identifier_still_matches() {
        let policy = LinkSelector::with_class("2col");
        assert!(policy.matches(&anchor(r#"<a class="2col" href="https://x.example">x</a>"#)));
        assert!(!policy.matches(&anchor(r#"<a class="col" href="https://x.example">x</a>"#)));

        let odd = LinkSelector::with_class("bad!");
        assert!(odd.matches(&anchor(r#"<a class="bad!" href="https://x.example">x</a>"#)));
    }

    #[test]
    fn default_predicate() {
        let config = Configuration {
            base_click_tracking_url: Some("https://t.example/c/".to_string()),
            ..Configuration::default()
        };
        assert!(is_trackable_href("https://example.com", &config));
        assert!(is_trackable_href(" HTTP://example.com/a ", &config));
        assert!(!is_trackable_href("mailto:someone@example.com", &config));
        assert!(!is_trackable_href("tel:+15550100", &config));
        assert!(!is_trackable_href("javascript:void(0)", &config));
        assert!(!is_trackable_href("/relative/path", &config));
        assert!(!is_trackable_href("https://t.example/c/eyJrIjoiY2xpY2sifQ", &config));
    }
}
