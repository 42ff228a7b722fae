// src/error.rs
// =============================================================================
// Error types for the crawl core.
//
// Only structural failures are errors here. Crawl outcomes such as a 404,
// an external redirect or an already-processed page are plain data and are
// reported through `PageOutcome` and the `CrawlReport` instead.
// =============================================================================

use thiserror::Error;

/// A raw href or landed URL that cannot be turned into a canonical key.
///
/// Callers log these and drop the single link; they never abort a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    /// The string is not a valid absolute or relative URL.
    #[error("invalid URL '{url}': {source}")]
    Invalid {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The URL parsed, but has no network origin (mailto:, javascript:, data: ...).
    #[error("URL '{url}' has no network origin (scheme '{scheme}')")]
    OpaqueOrigin { url: String, scheme: String },
}

/// A transport-level failure while fetching a page.
///
/// Fatal for that one request only. Retrying is left to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("too many redirects while fetching {url}")]
    TooManyRedirects { url: String },

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    /// The URL the failed request was made for.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::TooManyRedirects { url }
            | FetchError::Connect { url, .. }
            | FetchError::Body { url, .. }
            | FetchError::Other { url, .. } => url,
        }
    }
}

/// Problems with the site configuration, detected before crawling starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no base URL given; pass one or pick a --preset")]
    MissingBaseUrl,

    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: NormalizationError,
    },

    #[error("invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
