//! Crawls a documentation site from its root, captures the pages its TOC
//! sidebar declares, and reports every 404 together with the page that
//! first linked to it.
//!
//! The crawl core lives in [`crawl`]; the default HTTP renderer and HTML
//! extractor live in [`page`].

pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod page;

pub use config::{Preset, SiteConfig};
pub use crawl::{CrawlReport, Crawler};
pub use error::{ConfigError, FetchError, NormalizationError};
