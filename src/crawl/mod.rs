// src/crawl/mod.rs
// =============================================================================
// This module is the crawl core: frontier, dedup and broken-link reporting.
//
// Submodules:
// - normalize: canonical URL keys and the internal/external test
// - frontier: the shared queue + processed/enqueued/TOC sets
// - tracker: 404s and the page that linked to them
// - report: the final CrawlReport
// - orchestrator: the crawl loop and per-page state machine
//
// Nothing in here parses HTML or speaks HTTP; that is done by the
// collaborators in src/page/.
// =============================================================================

mod frontier;
mod normalize;
mod orchestrator;
mod report;
mod tracker;

pub use frontier::{FrontierEntry, FrontierStore, Referrer, TocCapture};
pub use normalize::{normalize, CanonicalUrl, SiteScope};
pub use orchestrator::{CancelHandle, Crawler, PageOutcome};
pub use report::{CrawlReport, FailedRequest};
pub use tracker::{BrokenLinkRecord, BrokenLinkTracker};
