//! Extension points for the HTML transformer

use crate::models::Metadata;

/// Per-link metadata enrichment hook.
///
/// Called once per rewritten link with the original `href` and a copy of the
/// document metadata; the returned mapping is what gets encoded for that link.
pub trait LinkProcessor {
    /// # Arguments
    /// * `url` - The link destination before rewriting
    /// * `metadata` - A copy of the document-level metadata
    ///
    /// # Returns
    /// * `Metadata` - The metadata to embed in this link's token
    fn process(&self, url: &str, metadata: Metadata) -> Metadata;
}

impl<F> LinkProcessor for F
where
    F: Fn(&str, Metadata) -> Metadata,
{
    fn process(&self, url: &str, metadata: Metadata) -> Metadata {
        self(url, metadata)
    }
}
