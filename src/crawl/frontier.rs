// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: the work queue plus the three dedup sets.
//
// This is the only shared mutable state in a crawl. Every page handler that
// is in flight talks to the same FrontierStore, so every operation takes a
// single lock over all of it:
//
//   processed  - canonical URLs a handler has claimed (fetched + classified)
//   enqueued   - canonical URLs discovered via a link or the TOC
//   seeded     - crawl seeds (the root and extra seeds), queued up front
//   toc        - canonical URLs declared by the navigation sidebar
//   queue      - pending FrontierEntry values in FIFO order
//
// Seeds are kept out of `enqueued` so that counter only reflects what the
// crawl discovered. A seed that a page later links to is counted then, but
// never queued a second time.
//
// Nothing outside this file reads a set and then writes it; callers only use
// the check-and-insert operations below, which is what keeps "no URL enqueued
// twice" and "no URL processed twice" true under concurrency.
// =============================================================================

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Serialize, Serializer};

use super::normalize::CanonicalUrl;

/// Where a frontier entry was discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Referrer {
    /// Found as a link on this page.
    Page(CanonicalUrl),
    /// The crawl root.
    InitialUrl,
    /// Declared in the TOC sidebar.
    InitialTocPage,
    /// Provenance not known, e.g. an extra seed given on the command line.
    #[default]
    Unknown,
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Referrer::Page(url) => write!(f, "{url}"),
            Referrer::InitialUrl => f.write_str("Initial URL"),
            Referrer::InitialTocPage => f.write_str("Initial TOC page"),
            Referrer::Unknown => f.write_str("Unknown"),
        }
    }
}

// Referrers go out as plain strings, same as they are logged
impl Serialize for Referrer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A unit of pending crawl work. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: CanonicalUrl,
    pub referrer: Referrer,
}

/// What a successful TOC capture did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocCapture {
    /// Distinct URLs now in the TOC set.
    pub declared: usize,
    /// How many of those were new to the frontier and got enqueued.
    pub enqueued: usize,
}

#[derive(Debug, Default)]
struct FrontierState {
    processed: HashSet<CanonicalUrl>,
    enqueued: HashSet<CanonicalUrl>,
    seeded: HashSet<CanonicalUrl>,
    toc: HashSet<CanonicalUrl>,
    queue: VecDeque<FrontierEntry>,
    closed: bool,
}

impl FrontierState {
    fn enqueue(&mut self, url: CanonicalUrl, referrer: Referrer) -> bool {
        if !self.enqueued.insert(url.clone()) || self.seeded.contains(&url) {
            return false;
        }
        self.queue.push_back(FrontierEntry { url, referrer });
        true
    }

    fn seed(&mut self, url: CanonicalUrl, referrer: Referrer) -> bool {
        if self.enqueued.contains(&url) || !self.seeded.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(FrontierEntry { url, referrer });
        true
    }
}

/// Thread-safe frontier shared by every page handler of one crawl.
#[derive(Debug, Default)]
pub struct FrontierStore {
    state: Mutex<FrontierState>,
}

impl FrontierStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the sets half-updated
    // (every mutation is a single insert/push), so a poisoned lock is still
    // safe to use.
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `url` for processing.
    ///
    /// Returns true exactly once per URL over the whole crawl; every later
    /// caller gets false and must skip the page.
    pub fn try_mark_processed(&self, url: &CanonicalUrl) -> bool {
        self.lock().processed.insert(url.clone())
    }

    /// Enqueues `url` unless it was ever enqueued before.
    ///
    /// Only the first caller's referrer is kept.
    pub fn try_enqueue(&self, url: CanonicalUrl, referrer: Referrer) -> bool {
        self.lock().enqueue(url, referrer)
    }

    /// Queues a crawl seed without counting it as enqueued.
    ///
    /// Returns false if `url` was already seeded or enqueued.
    pub fn seed(&self, url: CanonicalUrl, referrer: Referrer) -> bool {
        self.lock().seed(url, referrer)
    }

    /// One-shot capture of the TOC sidebar.
    ///
    /// The first call with a non-empty `urls` fills the TOC set and enqueues
    /// every TOC URL the frontier has not seen yet, all under one lock so no
    /// TOC link can be lost. Returns `None` when the TOC was already captured
    /// or `urls` is empty.
    pub fn capture_toc<I>(&self, urls: I) -> Option<TocCapture>
    where
        I: IntoIterator<Item = CanonicalUrl>,
    {
        let mut urls = urls.into_iter().peekable();
        urls.peek()?;

        let mut state = self.lock();
        if !state.toc.is_empty() {
            return None;
        }

        let mut enqueued = 0;
        for url in urls {
            if state.toc.insert(url.clone()) && state.enqueue(url, Referrer::InitialTocPage) {
                enqueued += 1;
            }
        }

        Some(TocCapture {
            declared: state.toc.len(),
            enqueued,
        })
    }

    /// True once a TOC capture has happened.
    pub fn toc_captured(&self) -> bool {
        !self.lock().toc.is_empty()
    }

    /// Pops the next pending entry (FIFO).
    ///
    /// Returns `None` when nothing is pending or after `close`.
    pub fn dequeue(&self) -> Option<FrontierEntry> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.queue.pop_front()
    }

    /// Stops handing out work. Entries already dequeued are unaffected.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    #[cfg(test)]
    pub fn is_toc(&self, url: &CanonicalUrl) -> bool {
        self.lock().toc.contains(url)
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn processed_count(&self) -> usize {
        self.lock().processed.len()
    }

    pub fn enqueued_count(&self) -> usize {
        self.lock().enqueued.len()
    }

    /// Sorted copy of the TOC set.
    pub fn toc_snapshot(&self) -> BTreeSet<CanonicalUrl> {
        self.lock().toc.iter().cloned().collect()
    }

    /// Sorted copy of the processed set.
    pub fn processed_snapshot(&self) -> BTreeSet<CanonicalUrl> {
        self.lock().processed.iter().cloned().collect()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why one Mutex instead of one per set?
//    - try_enqueue, capture_toc and dequeue touch several collections at once
//    - A single lock makes each of those operations all-or-nothing
//    - Nothing awaits while holding it, so a std Mutex is enough
//
// 2. What is PoisonError::into_inner?
//    - If a thread panics while holding a Mutex, the Mutex is "poisoned"
//    - lock() then returns Err(PoisonError) instead of the guard
//    - into_inner() hands us the guard anyway
//
// 3. What does `urls.peek()?` do?
//    - peek() looks at the next item without consuming it
//    - `?` on an Option returns None early if there is no item
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(raw: &str) -> CanonicalUrl {
        CanonicalUrl::parse(raw).unwrap()
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let store = FrontierStore::new();
        let a = url("https://site/docs/a");

        assert!(store.try_enqueue(a.clone(), Referrer::Page(url("https://site/docs"))));
        assert!(!store.try_enqueue(a.clone(), Referrer::Page(url("https://site/docs/x"))));

        assert_eq!(store.enqueued_count(), 1);
        assert_eq!(store.pending(), 1);

        // the first referrer wins
        let entry = store.dequeue().unwrap();
        assert_eq!(entry.url, a);
        assert_eq!(entry.referrer, Referrer::Page(url("https://site/docs")));
        assert_eq!(store.dequeue(), None);
    }

    #[test]
    fn test_dequeue_is_fifo() {
        let store = FrontierStore::new();
        for path in ["a", "b", "c"] {
            store.try_enqueue(url(&format!("https://site/{path}")), Referrer::Unknown);
        }

        let order: Vec<String> = std::iter::from_fn(|| store.dequeue())
            .map(|entry| entry.url.to_string())
            .collect();
        assert_eq!(order, ["https://site/a", "https://site/b", "https://site/c"]);
    }

    #[test]
    fn test_enqueue_after_dequeue_is_still_rejected() {
        let store = FrontierStore::new();
        let a = url("https://site/a");
        store.try_enqueue(a.clone(), Referrer::Page(url("https://site")));
        store.dequeue().unwrap();

        assert!(!store.try_enqueue(a, Referrer::Unknown));
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn test_seed_is_not_counted_until_linked() {
        let store = FrontierStore::new();
        let root = url("https://site/docs");

        assert!(store.seed(root.clone(), Referrer::InitialUrl));
        assert!(!store.seed(root.clone(), Referrer::Unknown));
        assert_eq!(store.enqueued_count(), 0);
        assert_eq!(store.pending(), 1);

        // a page linking back to the root counts it, but does not requeue it
        assert!(!store.try_enqueue(root.clone(), Referrer::Page(url("https://site/docs/a"))));
        assert_eq!(store.enqueued_count(), 1);
        assert_eq!(store.pending(), 1);
        assert_eq!(store.dequeue().unwrap().referrer, Referrer::InitialUrl);

        // a seed that was already discovered is not queued again either
        let a = url("https://site/docs/a");
        store.try_enqueue(a.clone(), Referrer::InitialTocPage);
        assert!(!store.seed(a, Referrer::Unknown));
        assert_eq!(store.pending(), 1);
    }

    #[test]
    fn test_mark_processed_once() {
        let store = FrontierStore::new();
        let a = url("https://site/a");
        assert!(store.try_mark_processed(&a));
        assert!(!store.try_mark_processed(&a));
        assert_eq!(store.processed_count(), 1);
    }

    #[test]
    fn test_capture_toc_runs_once() {
        let store = FrontierStore::new();
        store.try_enqueue(url("https://site/docs/a"), Referrer::Page(url("https://site/docs")));

        let capture = store
            .capture_toc(vec![url("https://site/docs/a"), url("https://site/docs/b")])
            .unwrap();
        assert_eq!(capture, TocCapture { declared: 2, enqueued: 1 });
        assert!(store.toc_captured());

        // a later page with a different sidebar changes nothing
        assert_eq!(store.capture_toc(vec![url("https://site/docs/z")]), None);
        assert!(!store.is_toc(&url("https://site/docs/z")));
        assert_eq!(store.toc_snapshot().len(), 2);
        assert_eq!(store.enqueued_count(), 2);
    }

    #[test]
    fn test_capture_toc_ignores_empty_input() {
        let store = FrontierStore::new();
        assert_eq!(store.capture_toc(Vec::new()), None);
        assert!(!store.toc_captured());

        // still open for the first real sidebar
        assert!(store.capture_toc(vec![url("https://site/docs/a")]).is_some());
    }

    #[test]
    fn test_toc_entries_use_toc_referrer() {
        let store = FrontierStore::new();
        store.capture_toc(vec![url("https://external.com/x")]);

        // no internal filter on TOC links
        let entry = store.dequeue().unwrap();
        assert_eq!(entry.url, url("https://external.com/x"));
        assert_eq!(entry.referrer, Referrer::InitialTocPage);
    }

    #[test]
    fn test_close_stops_dequeue() {
        let store = FrontierStore::new();
        store.seed(url("https://site/a"), Referrer::InitialUrl);
        store.close();

        assert!(store.is_closed());
        assert_eq!(store.dequeue(), None);
        assert_eq!(store.pending(), 1);
    }

    #[test]
    fn test_referrer_display() {
        assert_eq!(Referrer::InitialUrl.to_string(), "Initial URL");
        assert_eq!(Referrer::InitialTocPage.to_string(), "Initial TOC page");
        assert_eq!(Referrer::default().to_string(), "Unknown");
        assert_eq!(
            Referrer::Page(url("https://site/docs/")).to_string(),
            "https://site/docs"
        );
        assert_eq!(
            serde_json::to_string(&Referrer::InitialTocPage).unwrap(),
            "\"Initial TOC page\""
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_succeed_once() {
        let store = Arc::new(FrontierStore::new());
        let target = url("https://site/docs/shared");

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                let target = target.clone();
                tokio::spawn(async move {
                    let referrer = Referrer::Page(url(&format!("https://site/docs/p{i}")));
                    let enqueued = store.try_enqueue(target.clone(), referrer);
                    let claimed = store.try_mark_processed(&target);
                    (enqueued, claimed)
                })
            })
            .collect();

        let mut enqueued = 0;
        let mut claimed = 0;
        for handle in handles {
            let (e, c) = handle.await.unwrap();
            enqueued += usize::from(e);
            claimed += usize::from(c);
        }

        assert_eq!(enqueued, 1);
        assert_eq!(claimed, 1);
        assert_eq!(store.pending(), 1);
    }
}
