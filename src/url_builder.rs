//! Tracking URL assembly and token extraction.
//!
//! URL format: `<base_url>[/]<token>[/]`. Tokens never contain `/`, so the
//! token is always the last path segment.

use reqwest::Url;

use crate::config::Configuration;
use crate::error::ExtractionError;

/// Joins `base_url` and `token`, adding a separator when the base lacks one
/// and a trailing slash when requested.
pub fn build(base_url: &str, token: &str, append_slash: bool) -> String {
    let mut url = String::with_capacity(base_url.len() + token.len() + 2);
    url.push_str(base_url);
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(token);
    if append_slash && !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Pulls the token out of a full tracking URL or its path.
///
/// Query strings and fragments are ignored and a single trailing slash is
/// trimmed.
///
/// # Errors
/// * `ExtractionError` - `path_or_url` is not under `base_url`, or has no token
pub fn extract_token(path_or_url: &str, base_url: &str) -> Result<String, ExtractionError> {
    let fail = || ExtractionError {
        input: path_or_url.to_string(),
        base_url: base_url.to_string(),
    };

    let without_query = path_or_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let remainder = base_prefixes(base_url)
        .iter()
        .find_map(|prefix| without_query.strip_prefix(prefix.as_str()))
        .ok_or_else(fail)?;

    let token = remainder.strip_suffix('/').unwrap_or(remainder);
    if token.is_empty() || token.contains('/') {
        return Err(fail());
    }
    Ok(token.to_string())
}

/// Full-URL prefix first, then the bare path prefix when the base is absolute.
fn base_prefixes(base_url: &str) -> Vec<String> {
    let mut prefixes = vec![with_trailing_slash(base_url)];
    if let Ok(parsed) = Url::parse(base_url) {
        let path = with_trailing_slash(parsed.path());
        if !prefixes.contains(&path) {
            prefixes.push(path);
        }
    }
    prefixes
}

/// `base` with exactly one `/` appended when it lacks one.
pub(crate) fn with_trailing_slash(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

/// Whether `href` already points at one of the configured tracking endpoints.
pub fn is_tracking_url(href: &str, configuration: &Configuration) -> bool {
    [
        configuration.base_click_tracking_url.as_deref(),
        configuration.base_open_tracking_url.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|base| !base.is_empty())
    .any(|base| href.starts_with(with_trailing_slash(base).as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://t.example/o/";

    #[test]
    fn build_concatenates() {
        assert_eq!(build(BASE, "eyJ", false), "https://t.example/o/eyJ");
        assert_eq!(build(BASE, "eyJ", true), "https://t.example/o/eyJ/");
    }

    #[test]
    fn build_inserts_separator() {
        assert_eq!(build("https://t.example/o", "eyJ", false), "https://t.example/o/eyJ");
    }

    #[test]
    fn extract_from_full_url_and_path() {
        assert_eq!(extract_token("https://t.example/o/eyJ", BASE).unwrap(), "eyJ");
        assert_eq!(extract_token("/o/eyJ", BASE).unwrap(), "eyJ");
    }

    #[test]
    fn extract_trims_one_trailing_slash_and_query() {
        assert_eq!(extract_token("https://t.example/o/eyJ/", BASE).unwrap(), "eyJ");
        assert_eq!(extract_token("/o/eyJ?cache=1", BASE).unwrap(), "eyJ");
        assert!(extract_token("/o/eyJ//", BASE).is_err());
    }

    #[test]
    fn extract_rejects_foreign_paths() {
        let err = extract_token("https://other.example/o/eyJ", BASE).unwrap_err();
        assert_eq!(err.base_url, BASE);
        assert!(extract_token("/c/eyJ", BASE).is_err());
        assert!(extract_token("/o/", BASE).is_err());
        assert!(extract_token("/o/a/b", BASE).is_err());
    }

    #[test]
    fn extract_with_path_only_base() {
        assert_eq!(extract_token("/track/open/eyJ", "/track/open").unwrap(), "eyJ");
    }

    #[test]
    fn tracking_url_detection() {
        let config = Configuration {
            base_click_tracking_url: Some("https://t.example/c/".to_string()),
            ..Configuration::default()
        };
        assert!(is_tracking_url("https://t.example/c/eyJ", &config));
        assert!(!is_tracking_url("https://example.com/c/eyJ", &config));
    }

    #[test]
    fn tracking_url_detection_respects_segment_boundary() {
        let config = Configuration {
            base_click_tracking_url: Some("https://t.example/c".to_string()),
            ..Configuration::default()
        };
        assert!(is_tracking_url("https://t.example/c/eyJ", &config));
        assert!(!is_tracking_url("https://t.example/careers", &config));
        assert!(!is_tracking_url("https://t.example/c", &config));
    }
}
