// src/crawl/orchestrator.rs
// =============================================================================
// The crawl loop and the per-page state machine.
//
// How it works:
// 1. Seed the frontier with the base URL (and any extra seeds)
// 2. Dequeue entries and run up to `concurrency` page handlers at once
// 3. Each handler walks one entry through:
//
//      Dispatched -> Landed -> SkippedMalformed | SkippedExternal | SkippedDuplicate
//                           -> Classified -> NotFound | Crawled
//
// 4. Handlers feed new links back into the frontier
// 5. Stop when the queue is empty and no handler is in flight
//
// Which page gets credited as referrer for a link is decided by whichever
// handler reaches the frontier first. With concurrency > 1 that depends on
// response timing, so two runs over the same site can credit different
// referrers for the same URL.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use super::frontier::{FrontierEntry, FrontierStore, Referrer};
use super::normalize::{normalize, CanonicalUrl};
use super::report::{CrawlReport, FailedRequest};
use super::tracker::BrokenLinkTracker;
use crate::config::SiteConfig;
use crate::error::{FetchError, NormalizationError};
use crate::page::{PageExtractor, RenderedPage, Renderer};

const NOT_FOUND: u16 = 404;

/// Where a single frontier entry ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The landed URL could not be normalized.
    SkippedMalformed,
    /// The request landed outside the site (e.g. an external redirect).
    SkippedExternal,
    /// Another handler already claimed this canonical URL.
    SkippedDuplicate,
    /// The page answered 404 and was recorded as broken.
    NotFound,
    /// The page was crawled; `enqueued` of its `links` were new.
    Crawled { links: usize, enqueued: usize },
}

/// Stops a running crawl from another task (e.g. on Ctrl-C).
#[derive(Debug, Clone)]
pub struct CancelHandle {
    store: Arc<FrontierStore>,
}

impl CancelHandle {
    /// Stops new dequeues; pages already in flight still finish.
    pub fn cancel(&self) {
        info!("Cancelling crawl, waiting for in-flight pages to finish");
        self.store.close();
    }
}

pub struct Crawler<R, E> {
    config: SiteConfig,
    renderer: R,
    extractor: E,
    store: Arc<FrontierStore>,
    tracker: BrokenLinkTracker,
    counter: AtomicUsize,
}

impl<R: Renderer, E: PageExtractor> Crawler<R, E> {
    pub fn new(config: SiteConfig, renderer: R, extractor: E) -> Self {
        Self {
            config,
            renderer,
            extractor,
            store: Arc::new(FrontierStore::new()),
            tracker: BrokenLinkTracker::new(),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            store: Arc::clone(&self.store),
        }
    }

    /// Crawls the site and returns the final report.
    ///
    /// Fetch failures do not abort the crawl; they are logged and listed in
    /// the report's `failed_requests`.
    pub async fn run(&self) -> CrawlReport {
        let root = self.config.scope.root().clone();
        info!("Starting crawl at {}", root);
        self.store.seed(root, Referrer::InitialUrl);

        for seed in &self.config.seeds {
            match CanonicalUrl::parse(seed) {
                Ok(url) => {
                    self.store.seed(url, Referrer::Unknown);
                }
                Err(e) => warn!("Ignoring invalid seed URL {}: {}", seed, e),
            }
        }

        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);
        let mut in_flight = FuturesUnordered::new();
        let mut dispatched = 0usize;
        let mut failed_requests = Vec::new();

        loop {
            while in_flight.len() < self.config.concurrency {
                if self.limit_reached(dispatched, deadline) {
                    break;
                }
                let Some(entry) = self.store.dequeue() else {
                    break;
                };
                dispatched += 1;
                in_flight.push(async move {
                    let result = self.handle_page(&entry).await;
                    (entry, result)
                });
            }

            // Queue empty (or closed) and nothing in flight: the crawl is done
            let Some((entry, result)) = in_flight.next().await else {
                break;
            };

            if let Err(err) = result {
                error!("Failed to fetch {}: {}", entry.url, err);
                failed_requests.push(FailedRequest {
                    url: entry.url,
                    referrer: entry.referrer,
                    error: err.to_string(),
                });
            }
        }

        info!(
            "Crawl finished: {} requests dispatched, {} broken, {} still pending",
            dispatched,
            self.tracker.len(),
            self.store.pending()
        );
        if self.tracker.is_empty() {
            info!("No 404 errors found.");
        }

        CrawlReport::build(&self.store, &self.tracker, failed_requests)
    }

    // Closes the store once max_requests or the overall timeout is hit
    fn limit_reached(&self, dispatched: usize, deadline: Option<Instant>) -> bool {
        if self.store.is_closed() {
            return true;
        }

        let over_requests = self
            .config
            .max_requests
            .is_some_and(|max| dispatched >= max);
        let over_time = deadline.is_some_and(|deadline| Instant::now() >= deadline);

        if over_requests || over_time {
            info!(
                "Crawl limit reached after {} requests, no more pages will be dispatched",
                dispatched
            );
            self.store.close();
            return true;
        }
        false
    }

    /// Runs one frontier entry through the page state machine.
    pub async fn handle_page(&self, entry: &FrontierEntry) -> Result<PageOutcome, FetchError> {
        let page = self.renderer.fetch(entry.url.as_str()).await?;

        // Landed: canonicalize where the request actually ended up
        let (landed_base, landed) = match landed_url(&page) {
            Ok(landed) => landed,
            Err(e) => {
                warn!("Failed to normalize URL: {}, error: {}", page.landed_url, e);
                return Ok(PageOutcome::SkippedMalformed);
            }
        };

        if !self.config.scope.is_internal(&landed) {
            debug!("Skipping non-internal URL: {}", landed);
            return Ok(PageOutcome::SkippedExternal);
        }

        let count = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Processing URL {}: {}", count, landed);

        if !self.store.try_mark_processed(&landed) {
            debug!("Already processed URL: {}. Skipping.", landed);
            return Ok(PageOutcome::SkippedDuplicate);
        }

        if !self.store.toc_captured() {
            self.capture_toc(&page, &landed_base);
        }

        // Classified
        if page.status == NOT_FOUND {
            error!("404 Not Found: {}, Referrer: {}", landed, entry.referrer);
            self.tracker.record(landed, entry.referrer.clone());
            return Ok(PageOutcome::NotFound);
        }

        let links = self.extractor.extract_links(&page);
        debug!("Found {} links on {}", links.len(), landed);

        let mut enqueued = 0;
        for link in &links {
            let url = match normalize(&link.href, &landed_base) {
                Ok(url) => url,
                Err(e @ NormalizationError::OpaqueOrigin { .. }) => {
                    debug!("Skipping link '{}': {}", link.text, e);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to normalize URL: {}, error: {}", link.href, e);
                    continue;
                }
            };

            if !self.config.scope.is_internal(&url) {
                debug!("Skipping external link: {}", url);
                continue;
            }

            if self.store.try_enqueue(url.clone(), Referrer::Page(landed.clone())) {
                debug!("Enqueuing internal link: {}", url);
                enqueued += 1;
            }
        }

        Ok(PageOutcome::Crawled {
            links: links.len(),
            enqueued,
        })
    }

    // TOC hrefs are resolved against the page they were found on. Capture is
    // attempted on every page until one actually has a TOC.
    fn capture_toc(&self, page: &RenderedPage, base: &Url) {
        let hrefs = self.extractor.extract_toc(page);
        if hrefs.is_empty() {
            return;
        }
        info!("Found {} TOC links.", hrefs.len());

        let urls: Vec<CanonicalUrl> = hrefs
            .iter()
            .filter_map(|href| match normalize(href, base) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Failed to normalize TOC URL: {}, error: {}", href, e);
                    None
                }
            })
            .collect();

        match self.store.capture_toc(urls) {
            Some(capture) => info!(
                "Captured {} TOC links, {} newly enqueued",
                capture.declared, capture.enqueued
            ),
            None => debug!("TOC already captured by another page"),
        }
    }
}

fn landed_url(page: &RenderedPage) -> Result<(Url, CanonicalUrl), NormalizationError> {
    let url = Url::parse(&page.landed_url).map_err(|source| NormalizationError::Invalid {
        url: page.landed_url.clone(),
        source,
    })?;
    let canonical = CanonicalUrl::from_url(url.clone())?;
    Ok((url, canonical))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is FuturesUnordered?
//    - A set of futures that are polled together on the current task
//    - next().await returns whichever one finishes first
//    - Like buffer_unordered, but we decide when to push new work
//
// 2. What is `let ... else`?
//    - `let Some(x) = expr else { break; };` binds x or runs the else block
//    - The else block must leave the scope (break, return, continue, panic)
//
// 3. Why `async move` with `self` inside?
//    - `self` is a reference (&Crawler), so moving it just copies the pointer
//    - `entry` is moved in so the future owns it and can hand it back
// -----------------------------------------------------------------------------
