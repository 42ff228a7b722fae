// src/page/mod.rs
// =============================================================================
// Collaborators the crawl core talks to, but never implements itself.
//
// - Renderer: fetches a URL and reports where it landed + the status code
// - PageExtractor: pulls TOC hrefs and body links out of a fetched page
//
// The crawl core (src/crawl/) only depends on the two traits below. This
// module also ships default implementations:
// - http: HttpRenderer, backed by reqwest
// - html: SelectorExtractor, backed by scraper CSS selectors
//
// Rust concepts:
// - Traits: Shared behaviour that different types can implement
// - async-trait: Lets a trait have async methods that can be used as
//   `dyn Renderer` and sent between tasks
// =============================================================================

mod html;
mod http;

use async_trait::async_trait;

use crate::error::FetchError;

pub use html::SelectorExtractor;
pub use http::HttpRenderer;

// A fetched page, as the renderer saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// The URL the request settled on after following redirects
    pub landed_url: String,
    /// HTTP status code of the final response
    pub status: u16,
    /// Raw page body (HTML)
    pub body: String,
}

// One anchor found in a page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDetail {
    pub href: String,
    pub text: String,
}

/// Fetches pages.
///
/// A transport failure is returned as `FetchError` and is fatal for that
/// request only; the crawler does not retry.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RenderedPage, FetchError>;
}

/// Extracts raw hrefs from an already fetched page.
pub trait PageExtractor: Send + Sync {
    /// Hrefs of the TOC sidebar anchors, in document order.
    fn extract_toc(&self, page: &RenderedPage) -> Vec<String>;

    /// Body links, excluding anchors that belong to the TOC.
    fn extract_links(&self, page: &RenderedPage) -> Vec<LinkDetail>;
}
