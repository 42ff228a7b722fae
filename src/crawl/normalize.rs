// src/crawl/normalize.rs
// =============================================================================
// URL canonicalization.
//
// Every URL the crawler sees (landed URLs, TOC hrefs, body hrefs) is turned
// into a CanonicalUrl before it touches the frontier. Two raw URLs that differ
// only in fragment, trailing slash or query-parameter order map to the same
// key, so the dedup sets compare like with like.
//
// Canonical form: origin + path (trailing slashes stripped) + sorted query
//   https://x.io/a/?b=2&a=1#frag  ->  https://x.io/a?a=1&b=2
//   https://x.io/                 ->  https://x.io
// =============================================================================

use std::fmt;

use serde::Serialize;
use url::{form_urlencoded, Url};

use crate::error::NormalizationError;

/// The canonical string key for a page.
///
/// Only the normalizer builds these, so holding one means the string is
/// already canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Canonicalizes an absolute URL.
    pub fn parse(raw: &str) -> Result<Self, NormalizationError> {
        let url = Url::parse(raw).map_err(|source| NormalizationError::Invalid {
            url: raw.to_string(),
            source,
        })?;
        Self::from_url(url)
    }

    /// Canonicalizes an already parsed URL.
    pub fn from_url(mut url: Url) -> Result<Self, NormalizationError> {
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(NormalizationError::OpaqueOrigin {
                url: url.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        url.set_fragment(None);

        // sort_by is stable, so repeated names keep their value order
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let query = if pairs.is_empty() {
            String::new()
        } else {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            serializer.extend_pairs(&pairs);
            format!("?{}", serializer.finish())
        };

        // Stripping every trailing slash (not just one) keeps normalization
        // idempotent for paths like "/a//".
        let path = url.path().trim_end_matches('/');

        Ok(Self(format!(
            "{}{}{}",
            origin.ascii_serialization(),
            path,
            query
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves `raw` against `base` and canonicalizes the result.
///
/// `base` should be the URL of the page the href was found on, as the
/// browser saw it (before canonicalization), so that relative hrefs resolve
/// the same way they would when clicked.
pub fn normalize(raw: &str, base: &Url) -> Result<CanonicalUrl, NormalizationError> {
    let url = base.join(raw).map_err(|source| NormalizationError::Invalid {
        url: raw.to_string(),
        source,
    })?;
    CanonicalUrl::from_url(url)
}

/// Decides which canonical URLs belong to the site being crawled.
#[derive(Debug, Clone)]
pub struct SiteScope {
    prefix: CanonicalUrl,
    // Base URL had no path, so the prefix ends right after the host
    host_root: bool,
}

impl SiteScope {
    pub fn new(base_url: &str) -> Result<Self, NormalizationError> {
        let url = Url::parse(base_url).map_err(|source| NormalizationError::Invalid {
            url: base_url.to_string(),
            source,
        })?;
        let host_root = url.path().trim_end_matches('/').is_empty();

        Ok(Self {
            prefix: CanonicalUrl::from_url(url)?,
            host_root,
        })
    }

    /// The canonical base URL; also the crawl root.
    pub fn root(&self) -> &CanonicalUrl {
        &self.prefix
    }

    /// Plain, case-sensitive prefix test on the canonical string.
    ///
    /// Note that "https://site/docs" also matches "https://site/docs-old".
    /// A bare host prefix such as "https://x.io" only matches at the host
    /// boundary, so "https://x.io.evil.com" stays external.
    pub fn is_internal(&self, url: &CanonicalUrl) -> bool {
        let Some(rest) = url.as_str().strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        !self.host_root || rest.is_empty() || rest.starts_with(['/', '?', ':'])
    }
}
