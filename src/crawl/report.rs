// src/crawl/report.rs
// =============================================================================
// Post-crawl reporting.
//
// Once the frontier has drained, the broken-link records are filtered
// against the TOC set and combined with the frontier counters into one
// CrawlReport. Printing it (table or JSON) is left to main.rs.
// =============================================================================

use serde::Serialize;

use super::frontier::{FrontierStore, Referrer};
use super::normalize::CanonicalUrl;
use super::tracker::{BrokenLinkRecord, BrokenLinkTracker};

/// A request whose fetch failed at the transport level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRequest {
    pub url: CanonicalUrl,
    pub referrer: Referrer,
    pub error: String,
}

/// Final result of a crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// 404s that are not declared in the TOC, with their referrers.
    pub broken_links: Vec<BrokenLinkRecord>,
    pub processed_count: usize,
    pub enqueued_count: usize,
    /// Every 404 seen, before the TOC filter.
    pub broken_count: usize,
    /// Size of the captured TOC set.
    pub toc_count: usize,
    /// Processed pages that the TOC does not declare, sorted.
    pub undeclared_pages: Vec<CanonicalUrl>,
    pub failed_requests: Vec<FailedRequest>,
    /// True if the crawl was stopped with work still queued.
    pub cancelled: bool,
}

impl CrawlReport {
    /// Builds the report from the state a finished crawl left behind.
    ///
    /// 404s for URLs declared in the TOC are left out of `broken_links`
    /// (they still count towards `broken_count`).
    pub fn build(
        store: &FrontierStore,
        tracker: &BrokenLinkTracker,
        failed_requests: Vec<FailedRequest>,
    ) -> Self {
        let records = tracker.snapshot();
        let broken_count = records.len();

        let toc = store.toc_snapshot();
        let broken_links = records
            .into_iter()
            .filter(|record| !toc.contains(&record.url))
            .collect();

        let undeclared_pages = store
            .processed_snapshot()
            .into_iter()
            .filter(|url| !toc.contains(url))
            .collect();

        Self {
            broken_links,
            processed_count: store.processed_count(),
            enqueued_count: store.enqueued_count(),
            broken_count,
            toc_count: toc.len(),
            undeclared_pages,
            failed_requests,
            cancelled: store.is_closed() && store.pending() > 0,
        }
    }

    pub fn has_broken_links(&self) -> bool {
        !self.broken_links.is_empty()
    }
}
