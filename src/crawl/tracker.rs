// src/crawl/tracker.rs
// =============================================================================
// Collects every 404 seen during a crawl together with the page that linked
// to it. No dedup here: a URL is only classified once (the frontier's
// processed set guarantees that), so each broken URL shows up at most once.
// =============================================================================

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::frontier::Referrer;
use super::normalize::CanonicalUrl;

/// A page that answered 404, and who linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLinkRecord {
    pub url: CanonicalUrl,
    pub referrer: Referrer,
}

/// Append-only list of broken links, shared by all page handlers.
#[derive(Debug, Default)]
pub struct BrokenLinkTracker {
    records: Mutex<Vec<BrokenLinkRecord>>,
}

impl BrokenLinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, url: CanonicalUrl, referrer: Referrer) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BrokenLinkRecord { url, referrer });
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all records, in the order they were recorded.
    pub fn snapshot(&self) -> Vec<BrokenLinkRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
