//! Presentation-facing state for one signed-in user
//!
//! Wraps the paged cache and the mutator behind the two intents the table
//! raises (`request_page`, `commit_edit`) and reports per-page and per-edit
//! state the renderer can draw without knowing how the cache works.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::cache::{PageState, PagedCache};
use crate::error::{CoreError, DefaultErrorLogger, EditError, ErrorContext, ErrorLogger, FetchError};
use crate::fetcher::{PageFetcher, StoreClient};
use crate::models::{PageKey, PageResult, TransactionRecord};
use crate::mutator::{validate_description, DescriptionUpdater, OptimisticMutator};
use crate::pagination::{page_window, PageLink};

/// What the table should draw for one page request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum PageView {
    /// Carries the previously shown page, if any, so the table can stay
    /// on screen dimmed while the new one loads
    Loading { previous: Option<PageResult> },
    Error(String),
    Ready(PageResult),
}

/// Outcome of the latest edit of one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum EditStatus {
    Pending,
    Committed(TransactionRecord),
    RolledBack(String),
}

pub struct Dashboard {
    user_id: String,
    page_size: u32,
    cache: Arc<PagedCache>,
    mutator: OptimisticMutator,
    /// Latest edit ticket and status per record id
    edits: Mutex<HashMap<String, (u64, EditStatus)>>,
    next_ticket: AtomicU64,
    /// Page most recently shown, used as the loading placeholder
    last_shown: Mutex<Option<PageKey>>,
    logger: Box<dyn ErrorLogger>,
}

impl Dashboard {
    pub fn new(
        user_id: &str,
        page_size: u32,
        fetcher: Arc<dyn PageFetcher>,
        updater: Arc<dyn DescriptionUpdater>,
    ) -> Self {
        let cache = Arc::new(PagedCache::new(fetcher));
        Self {
            user_id: user_id.to_string(),
            page_size: page_size.max(1),
            mutator: OptimisticMutator::new(cache.clone(), updater),
            cache,
            edits: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
            last_shown: Mutex::new(None),
            logger: Box::new(DefaultErrorLogger),
        }
    }

    /// Dashboard reading and writing through one store client
    pub fn for_client(user_id: &str, page_size: u32, client: StoreClient) -> Self {
        let client = Arc::new(client);
        Self::new(user_id, page_size, client.clone(), client)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cache(&self) -> &Arc<PagedCache> {
        &self.cache
    }

    fn key(&self, page: u32) -> Result<PageKey, FetchError> {
        PageKey::new(page, self.page_size)
    }

    /// Page-change intent: load `page` (from cache when fresh)
    pub async fn request_page(&self, page: u32) -> Result<PageResult, FetchError> {
        match self.cache.get(page, self.page_size).await {
            Ok(result) => {
                *self.last_shown.lock().unwrap_or_else(PoisonError::into_inner) = Some(result.key());
                Ok(result)
            }
            Err(e) => {
                let context = ErrorContext::new("request_page")
                    .with_user_id(&self.user_id)
                    .with_data("page", serde_json::json!(page));
                self.logger.log_error(&CoreError::from(e.clone()), &context);
                Err(e)
            }
        }
    }

    /// Force a trip to the store for `page`
    pub async fn reload_page(&self, page: u32) -> Result<PageResult, FetchError> {
        self.cache.refetch(page, self.page_size).await
    }

    /// Current state of `page` as the renderer should show it
    pub fn page_view(&self, page: u32) -> PageView {
        let key = match self.key(page) {
            Ok(key) => key,
            Err(e) => return PageView::Error(e.to_string()),
        };
        match self.cache.state(key) {
            PageState::Ready => match self.cache.peek(key) {
                Some(result) => PageView::Ready(result),
                None => PageView::Loading { previous: None },
            },
            PageState::Failed(e) => PageView::Error(e.to_string()),
            PageState::Absent | PageState::Loading => PageView::Loading {
                previous: self.placeholder(key),
            },
        }
    }

    fn placeholder(&self, key: PageKey) -> Option<PageResult> {
        if let Some(own) = self.cache.peek(key) {
            return Some(own);
        }
        let shown = *self.last_shown.lock().unwrap_or_else(PoisonError::into_inner);
        shown.and_then(|k| self.cache.peek(k))
    }

    /// Page-number strip for the page currently shown as `page`
    pub fn page_links(&self, page: u32) -> Vec<PageLink> {
        self.key(page)
            .ok()
            .and_then(|key| self.cache.peek(key))
            .map(|result| page_window(page, result.total_pages()))
            .unwrap_or_default()
    }

    /// Edit-commit intent
    pub async fn commit_edit(
        &self,
        record_id: &str,
        text: &str,
    ) -> Result<TransactionRecord, EditError> {
        validate_description(text)?;

        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        self.record_edit(record_id, ticket, EditStatus::Pending);

        let outcome = self.mutator.commit_edit(record_id, text).await;
        match &outcome {
            Ok(record) => self.record_edit(record_id, ticket, EditStatus::Committed(record.clone())),
            Err(e) => {
                let context = ErrorContext::new("commit_edit")
                    .with_user_id(&self.user_id)
                    .with_data("record_id", serde_json::json!(record_id));
                self.logger.log_error(&CoreError::from(e.clone()), &context);
                self.record_edit(record_id, ticket, EditStatus::RolledBack(e.to_string()));
            }
        }
        outcome
    }

    /// A newer edit of the same record owns the status slot; older
    /// resolutions still ran their cache logic but do not overwrite it.
    fn record_edit(&self, record_id: &str, ticket: u64, status: EditStatus) {
        let mut edits = self.edits.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = edits
            .entry(record_id.to_string())
            .or_insert((ticket, EditStatus::Pending));
        if ticket >= slot.0 {
            *slot = (ticket, status);
        }
    }

    /// The record as the cache currently shows it, from any cached page
    pub fn cached_record(&self, record_id: &str) -> Option<TransactionRecord> {
        self.cache
            .peek_all()
            .into_values()
            .find_map(|page| page.find(record_id).cloned())
    }

    pub fn edit_status(&self, record_id: &str) -> Option<EditStatus> {
        self.edits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(record_id)
            .map(|(_, status)| status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::FixedIdentity;
    use crate::store::InMemoryStore;
    use crate::testing::{numbered_records, page_of, wait_until, ScriptedFetcher, ScriptedUpdater};

    fn store_dashboard(rows: usize) -> (Arc<InMemoryStore>, Dashboard) {
        let store = Arc::new(InMemoryStore::with_records(numbered_records("u1", rows)));
        let client = StoreClient::new(store.clone(), Arc::new(FixedIdentity::user("u1")));
        (store, Dashboard::for_client("u1", 10, client))
    }

    /// Reads from a 30-row store, writes through `updater`
    fn scripted_edits(updater: Arc<ScriptedUpdater>) -> Arc<Dashboard> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(StoreClient::new(
            Arc::new(InMemoryStore::with_records(numbered_records("u1", 30))),
            Arc::new(FixedIdentity::user("u1")),
        ));
        Arc::new(Dashboard::new("u1", 10, fetcher, updater))
    }

    #[tokio::test]
    async fn test_end_to_end_last_page_edit() {
        let (store, dashboard) = store_dashboard(125);

        let page = dashboard.request_page(13).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_pages(), 13);

        let target = page.items[2].id.clone();
        let record = dashboard.commit_edit(&target, "Server side").await.unwrap();
        assert_eq!(record.description, "Server side");
        assert_eq!(
            dashboard.edit_status(&target),
            Some(EditStatus::Committed(record.clone()))
        );

        match dashboard.page_view(13) {
            PageView::Ready(cached) => {
                assert_eq!(cached.find(&target).unwrap().description, "Server side")
            }
            other => panic!("unexpected view {:?}", other),
        }

        let refetched = dashboard.reload_page(13).await.unwrap();
        assert_eq!(refetched.find(&target).unwrap().description, "Server side");
        assert_eq!(store.get(&target).await.unwrap().description, "Server side");
    }

    #[tokio::test]
    async fn test_page_views_follow_cache_state() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let dashboard = Arc::new(Dashboard::new(
            "u1",
            10,
            fetcher.clone(),
            Arc::new(ScriptedUpdater::new()),
        ));

        assert_eq!(dashboard.page_view(1), PageView::Loading { previous: None });

        let request = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.request_page(1).await }
        });
        wait_until(|| fetcher.calls() == 1).await;
        assert_eq!(dashboard.page_view(1), PageView::Loading { previous: None });

        let first = page_of("u1", 1, 10, 30);
        fetcher.resolve(0, Ok(first.clone()));
        request.await.unwrap().unwrap();
        assert_eq!(dashboard.page_view(1), PageView::Ready(first.clone()));
        assert_eq!(dashboard.page_links(1).len(), 3);

        // page 2 loading shows page 1 as placeholder, then fails
        let request = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.request_page(2).await }
        });
        wait_until(|| fetcher.calls() == 2).await;
        assert_eq!(
            dashboard.page_view(2),
            PageView::Loading { previous: Some(first) }
        );
        fetcher.resolve(1, Err(FetchError::Remote("Failed to load transactions".into())));
        request.await.unwrap().unwrap_err();
        assert_eq!(
            dashboard.page_view(2),
            PageView::Error("Failed to load transactions".into())
        );
    }

    #[tokio::test]
    async fn test_edit_status_pending_then_rolled_back() {
        let updater = Arc::new(ScriptedUpdater::new());
        let dashboard = scripted_edits(updater.clone());
        dashboard.request_page(1).await.unwrap();

        let edit = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.commit_edit("tx-001", "Coffee").await }
        });
        wait_until(|| updater.calls() == 1).await;
        assert_eq!(dashboard.edit_status("tx-001"), Some(EditStatus::Pending));
        assert_eq!(dashboard.cached_record("tx-001").unwrap().description, "Coffee");

        updater.resolve(0, Err(EditError::Remote("network error".into())));
        edit.await.unwrap().unwrap_err();
        assert_eq!(
            dashboard.edit_status("tx-001"),
            Some(EditStatus::RolledBack("network error".into()))
        );
        assert_eq!(dashboard.cached_record("tx-001").unwrap().description, "Row 1");
        assert_eq!(dashboard.cached_record("tx-999"), None);
    }

    #[tokio::test]
    async fn test_older_edit_does_not_overwrite_newer_status() {
        let updater = Arc::new(ScriptedUpdater::new());
        let dashboard = scripted_edits(updater.clone());
        dashboard.request_page(1).await.unwrap();

        let first = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.commit_edit("tx-001", "First").await }
        });
        wait_until(|| updater.calls() == 1).await;
        let second = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.commit_edit("tx-001", "Second").await }
        });
        wait_until(|| updater.calls() == 2).await;

        updater.resolve(0, Err(EditError::Remote("network error".into())));
        first.await.unwrap().unwrap_err();
        assert_eq!(dashboard.edit_status("tx-001"), Some(EditStatus::Pending));

        let mut confirmed = numbered_records("u1", 1)[0].clone();
        confirmed.description = "Second".into();
        updater.resolve(1, Ok(confirmed.clone()));
        second.await.unwrap().unwrap();
        assert_eq!(
            dashboard.edit_status("tx-001"),
            Some(EditStatus::Committed(confirmed))
        );
    }

    #[tokio::test]
    async fn test_blank_edit_leaves_no_status() {
        let (_, dashboard) = store_dashboard(30);
        dashboard.request_page(1).await.unwrap();

        assert_eq!(
            dashboard.commit_edit("tx-001", "  ").await,
            Err(EditError::EmptyDescription)
        );
        assert_eq!(dashboard.edit_status("tx-001"), None);
    }

    #[tokio::test]
    async fn test_unauthorized_page() {
        let store = Arc::new(InMemoryStore::with_records(numbered_records("u1", 5)));
        let client = StoreClient::new(store, Arc::new(FixedIdentity::anonymous()));
        let dashboard = Dashboard::for_client("u1", 10, client);

        assert_eq!(dashboard.request_page(1).await, Err(FetchError::Unauthorized));
        assert_eq!(dashboard.page_view(1), PageView::Error("Unauthorized".into()));
    }

    #[test]
    fn test_page_view_serializes_with_status_tag() {
        let json = serde_json::to_value(PageView::Error("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "error", "data": "boom" }));
    }
}
