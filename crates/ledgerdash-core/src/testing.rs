//! Test doubles shared by the unit tests of this crate

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::error::{EditError, FetchError, StoreError};
use crate::fetcher::{PageFetcher, StoreClient};
use crate::identity::FixedIdentity;
use crate::models::{PageKey, PageResult, TransactionRecord};
use crate::mutator::DescriptionUpdater;
use crate::store::{InMemoryStore, TransactionStore};

/// `n` rows named `tx-001..`, one day apart, newest first
pub fn numbered_records(user_id: &str, n: usize) -> Vec<TransactionRecord> {
    let newest = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    (1..=n)
        .map(|i| {
            let date = newest - Duration::days(i as i64);
            let mut record = TransactionRecord::new(
                format!("tx-{:03}", i),
                user_id,
                date,
                "CHK-001234",
                format!("Row {}", i),
                Decimal::new(-(i as i64) * 100, 2),
            );
            record.created_at = date.and_hms_opt(12, 0, 0).unwrap().and_utc();
            record
        })
        .collect()
}

/// Page `page` of `numbered_records(user_id, total)`
pub fn page_of(user_id: &str, page: u32, page_size: u32, total: usize) -> PageResult {
    let offset = (page as usize - 1) * page_size as usize;
    let items = numbered_records(user_id, total)
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect();
    PageResult {
        items,
        total_count: total as u64,
        page,
        page_size,
    }
}

/// Yield to other tasks until `condition` holds
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Calls parked until the test resolves them, one oneshot per call
pub struct Gate<Req, Resp> {
    calls: Mutex<Vec<(Req, Option<oneshot::Sender<Resp>>)>>,
}

impl<Req: Clone, Resp> Gate<Req, Resp> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn enter(&self, request: Req) -> Resp {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().unwrap().push((request, Some(tx)));
        rx.await.expect("gate call dropped without a response")
    }

    pub fn resolve(&self, index: usize, response: Resp) {
        let sender = self.calls.lock().unwrap()[index]
            .1
            .take()
            .expect("call already resolved");
        let _ = sender.send(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Req> {
        self.calls.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }
}

/// Fetcher whose every call waits for `resolve`
pub struct ScriptedFetcher {
    gate: Gate<PageKey, Result<PageResult, FetchError>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self { gate: Gate::new() }
    }

    pub fn calls(&self) -> usize {
        self.gate.calls()
    }

    pub fn call_index(&self, key: PageKey) -> Option<usize> {
        self.gate.requests().iter().position(|k| *k == key)
    }

    pub fn resolve(&self, index: usize, outcome: Result<PageResult, FetchError>) {
        self.gate.resolve(index, outcome);
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<PageResult, FetchError> {
        self.gate.enter(PageKey { page, page_size }).await
    }
}

/// Store-backed fetcher that counts calls and yields once per call
pub struct CountingFetcher {
    inner: StoreClient,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new(inner: StoreClient) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_rows(user_id: &str, n: usize) -> Self {
        let store = InMemoryStore::with_records(numbered_records(user_id, n));
        Self::new(StoreClient::new(
            Arc::new(store),
            Arc::new(FixedIdentity::user(user_id)),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<PageResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.fetch(page, page_size).await
    }
}

/// Updater whose every call waits for `resolve`
pub struct ScriptedUpdater {
    gate: Gate<(String, String), Result<TransactionRecord, EditError>>,
}

impl ScriptedUpdater {
    pub fn new() -> Self {
        Self { gate: Gate::new() }
    }

    pub fn calls(&self) -> usize {
        self.gate.calls()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.gate.requests()
    }

    pub fn resolve(&self, index: usize, outcome: Result<TransactionRecord, EditError>) {
        self.gate.resolve(index, outcome);
    }
}

#[async_trait]
impl DescriptionUpdater for ScriptedUpdater {
    async fn update_description(
        &self,
        id: &str,
        description: &str,
    ) -> Result<TransactionRecord, EditError> {
        self.gate
            .enter((id.to_string(), description.to_string()))
            .await
    }
}

/// Store that fails every call with the same error
pub struct FailingStore {
    error: StoreError,
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(message: &str) -> Self {
        Self::with_error(StoreError::Unavailable {
            message: message.to_string(),
        })
    }

    pub fn with_error(error: StoreError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionStore for FailingStore {
    async fn select_page(
        &self,
        _user_id: &str,
        _offset: u64,
        _limit: u32,
    ) -> Result<(Vec<TransactionRecord>, u64), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn update_description(
        &self,
        _user_id: &str,
        _id: &str,
        _description: &str,
    ) -> Result<TransactionRecord, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}
