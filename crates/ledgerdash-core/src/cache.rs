//! Paged cache with single-flight fetches and superseded-response discard
//!
//! Each page key moves through `Absent -> Loading -> Ready | Failed`.
//! A key has at most one outstanding fetch; later callers attach to it
//! through a shared `OnceCell`. Every fetch carries a per-key sequence
//! number and only the newest one may write the entry, so a slow response
//! can never overwrite a newer one.
//!
//! The entry map sits behind a `std::sync::Mutex` that is never held
//! across an await; every transition is one critical section.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::models::{PageKey, PageResult, TransactionRecord};

type FetchOutcome = Result<PageResult, FetchError>;

/// Lifecycle of one cached page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageState {
    #[default]
    Absent,
    Loading,
    Ready,
    Failed(FetchError),
}

/// Outstanding fetch shared by every caller waiting on the same key
#[derive(Clone)]
struct Flight {
    seq: u64,
    outcome: Arc<OnceCell<FetchOutcome>>,
}

#[derive(Default)]
struct CacheEntry {
    state: PageState,
    /// Last successful result, kept while a refetch is loading
    result: Option<PageResult>,
    stale: bool,
    in_flight: Option<Flight>,
    /// Sequence number of the newest fetch issued for this key
    last_seq: u64,
}

impl CacheEntry {
    fn begin_fetch(&mut self, key: PageKey) -> Flight {
        self.last_seq += 1;
        let flight = Flight {
            seq: self.last_seq,
            outcome: Arc::new(OnceCell::new()),
        };
        if let Some(previous) = self.in_flight.replace(flight.clone()) {
            log::debug!("cache: {} fetch #{} superseded by #{}", key, previous.seq, flight.seq);
        } else {
            log::debug!("cache: {} fetch #{} started", key, flight.seq);
        }
        self.state = PageState::Loading;
        flight
    }

    /// Forget the outstanding fetch; its completion will be ignored
    fn abandon_fetch(&mut self) -> bool {
        if self.in_flight.take().is_none() {
            return false;
        }
        if self.result.is_some() {
            self.state = PageState::Ready;
            self.stale = true;
        } else {
            self.state = PageState::Absent;
        }
        true
    }
}

/// Cache of fetched pages keyed by `(page, page_size)`
pub struct PagedCache {
    fetcher: Arc<dyn PageFetcher>,
    entries: Mutex<BTreeMap<PageKey, CacheEntry>>,
}

impl PagedCache {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PageKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the page, fetching it unless a fresh copy is cached.
    ///
    /// A caller arriving while the same key is loading waits on that
    /// fetch instead of issuing another one.
    pub async fn get(&self, page: u32, page_size: u32) -> Result<PageResult, FetchError> {
        let key = PageKey::new(page, page_size)?;
        let flight = {
            let mut entries = self.lock();
            let entry = entries.entry(key).or_default();
            if let Some(flight) = entry.in_flight.clone() {
                log::debug!("cache: {} joining fetch #{}", key, flight.seq);
                flight
            } else {
                if entry.state == PageState::Ready && !entry.stale {
                    if let Some(result) = &entry.result {
                        return Ok(result.clone());
                    }
                }
                entry.begin_fetch(key)
            }
        };
        self.complete(key, flight).await
    }

    /// Fetch the page again even if a fetch for it is already running.
    /// The running fetch is superseded and its response discarded.
    pub async fn refetch(&self, page: u32, page_size: u32) -> Result<PageResult, FetchError> {
        let key = PageKey::new(page, page_size)?;
        let flight = self.lock().entry(key).or_default().begin_fetch(key);
        self.complete(key, flight).await
    }

    async fn complete(&self, key: PageKey, flight: Flight) -> FetchOutcome {
        let outcome = flight
            .outcome
            .get_or_init(|| self.fetcher.fetch(key.page, key.page_size))
            .await
            .clone();
        self.settle(key, flight.seq, &outcome);
        outcome
    }

    /// Record a finished fetch if it is still the one the entry waits for.
    /// Every waiter calls this; only the first call for the current flight
    /// writes anything.
    fn settle(&self, key: PageKey, seq: u64, outcome: &FetchOutcome) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&key) else {
            return;
        };
        match &entry.in_flight {
            Some(current) if current.seq == seq => {}
            Some(current) => {
                log::debug!(
                    "cache: discarding {} response #{} (newest is #{})",
                    key,
                    seq,
                    current.seq
                );
                return;
            }
            None => {
                log::trace!("cache: {} response #{} already settled or abandoned", key, seq);
                return;
            }
        }

        entry.in_flight = None;
        match outcome {
            Ok(result) => {
                log::debug!("cache: {} ready ({} rows)", key, result.items.len());
                entry.result = Some(result.clone());
                entry.state = PageState::Ready;
                entry.stale = false;
            }
            Err(e) => {
                log::debug!("cache: {} failed: {}", key, e);
                entry.state = PageState::Failed(e.clone());
            }
        }
    }

    /// Every `Ready` page, without triggering fetches
    pub fn peek_all(&self) -> BTreeMap<PageKey, PageResult> {
        self.lock()
            .iter()
            .filter(|(_, entry)| entry.state == PageState::Ready)
            .filter_map(|(key, entry)| entry.result.clone().map(|r| (*key, r)))
            .collect()
    }

    /// Last successful result for a key, even while it reloads
    pub fn peek(&self, key: PageKey) -> Option<PageResult> {
        self.lock().get(&key).and_then(|entry| entry.result.clone())
    }

    pub fn state(&self, key: PageKey) -> PageState {
        self.lock()
            .get(&key)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    pub fn is_stale(&self, key: PageKey) -> bool {
        self.lock().get(&key).is_some_and(|entry| entry.stale)
    }

    /// Replace the items of a cached page without contacting the store.
    /// The page state is left as it is. Returns false when nothing is
    /// cached for the key.
    pub fn apply_local(&self, key: PageKey, items: Vec<TransactionRecord>) -> bool {
        self.patch_local(key, |current| *current = items)
    }

    /// Edit a cached page's items in place, reading its current contents
    /// under the same lock the write happens under.
    pub fn patch_local<F>(&self, key: PageKey, patch: F) -> bool
    where
        F: FnOnce(&mut Vec<TransactionRecord>),
    {
        let mut entries = self.lock();
        match entries.get_mut(&key).and_then(|entry| entry.result.as_mut()) {
            Some(result) => {
                patch(&mut result.items);
                true
            }
            None => false,
        }
    }

    /// Mark every page stale so its next `get` goes back to the store.
    /// Fetches already running are abandoned, their data may predate
    /// whatever caused the invalidation.
    pub fn invalidate_all(&self) {
        let mut entries = self.lock();
        for entry in entries.values_mut() {
            entry.abandon_fetch();
            entry.stale = true;
        }
        log::debug!("cache: invalidated {} pages", entries.len());
    }

    /// Abandon every outstanding fetch. Waiting callers still receive
    /// their own response; the cache ignores it.
    pub fn cancel_in_flight(&self) -> usize {
        let mut entries = self.lock();
        let cancelled = entries
            .values_mut()
            .map(CacheEntry::abandon_fetch)
            .filter(|abandoned| *abandoned)
            .count();
        if cancelled > 0 {
            log::debug!("cache: cancelled {} outstanding fetches", cancelled);
        }
        cancelled
    }

    /// Number of keys the cache knows about
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ==================== Tests ====================
