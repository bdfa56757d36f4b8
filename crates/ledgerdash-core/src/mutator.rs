//! Optimistic description edits with snapshot rollback

use async_trait::async_trait;
use std::sync::Arc;

use crate::cache::PagedCache;
use crate::error::EditError;
use crate::fetcher::StoreClient;
use crate::models::{PageKey, TransactionRecord};

/// Remote write used to persist an edit
#[async_trait]
pub trait DescriptionUpdater: Send + Sync {
    async fn update_description(
        &self,
        id: &str,
        description: &str,
    ) -> Result<TransactionRecord, EditError>;
}

#[async_trait]
impl DescriptionUpdater for StoreClient {
    async fn update_description(
        &self,
        id: &str,
        description: &str,
    ) -> Result<TransactionRecord, EditError> {
        let user_id = self.identity.current_user()?;
        Ok(self.store.update_description(&user_id, id, description).await?)
    }
}

/// Trimmed description, or `EmptyDescription` when nothing is left
pub fn validate_description(text: &str) -> Result<&str, EditError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(EditError::EmptyDescription)
    } else {
        Ok(trimmed)
    }
}

/// Copies of every cached page holding the edited record, taken right
/// before the optimistic write. Consumed exactly once: dropped on commit,
/// replayed on rollback.
#[derive(Debug)]
pub struct EditSnapshot {
    pages: Vec<(PageKey, Vec<TransactionRecord>)>,
}

impl EditSnapshot {
    pub fn capture(cache: &PagedCache, record_id: &str) -> Self {
        let pages = cache
            .peek_all()
            .into_iter()
            .filter(|(_, page)| page.contains(record_id))
            .map(|(key, page)| (key, page.items))
            .collect();
        Self { pages }
    }

    pub fn keys(&self) -> impl Iterator<Item = PageKey> + '_ {
        self.pages.iter().map(|(key, _)| *key)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Put every page back exactly as captured; returns how many were restored
    pub fn restore(self, cache: &PagedCache) -> usize {
        self.pages
            .into_iter()
            .map(|(key, items)| cache.apply_local(key, items))
            .filter(|restored| *restored)
            .count()
    }
}

/// Applies an edit to the cache first, then to the store
pub struct OptimisticMutator {
    cache: Arc<PagedCache>,
    updater: Arc<dyn DescriptionUpdater>,
}

impl OptimisticMutator {
    pub fn new(cache: Arc<PagedCache>, updater: Arc<dyn DescriptionUpdater>) -> Self {
        Self { cache, updater }
    }

    /// Edit one record's description.
    ///
    /// Every cached page holding the record shows the new text before the
    /// store answers. On success the cache is invalidated so later reads
    /// pick up server truth; on failure the touched pages are restored to
    /// their pre-edit items and the error is returned.
    ///
    /// A blank description is rejected without touching cache or store. An
    /// edit that changes nothing returns the cached record unchanged.
    pub async fn commit_edit(
        &self,
        record_id: &str,
        new_description: &str,
    ) -> Result<TransactionRecord, EditError> {
        let description = validate_description(new_description)?;

        if let Some(unchanged) = self.unchanged_copy(record_id, description) {
            log::debug!("edit {}: description unchanged, nothing to do", record_id);
            return Ok(unchanged);
        }

        // responses already on their way predate this edit
        self.cache.cancel_in_flight();

        let snapshot = EditSnapshot::capture(&self.cache, record_id);
        for key in snapshot.keys() {
            self.cache.patch_local(key, |items| {
                for item in items.iter_mut().filter(|t| t.id == record_id) {
                    item.description = description.to_string();
                }
            });
        }
        if snapshot.is_empty() {
            log::debug!("edit {}: record not on any cached page", record_id);
        } else {
            log::debug!(
                "edit {}: applied optimistically to {} cached pages",
                record_id,
                snapshot.pages.len()
            );
        }

        match self.updater.update_description(record_id, description).await {
            Ok(record) => {
                drop(snapshot);
                self.cache.invalidate_all();
                log::info!("edit {}: committed", record_id);
                Ok(record)
            }
            Err(e) => {
                let restored = snapshot.restore(&self.cache);
                log::warn!(
                    "edit {}: rejected ({}), rolled back {} pages",
                    record_id,
                    e,
                    restored
                );
                Err(e)
            }
        }
    }

    /// The cached record when every cached copy already carries `description`
    fn unchanged_copy(&self, record_id: &str, description: &str) -> Option<TransactionRecord> {
        let pages = self.cache.peek_all();
        let mut copies = pages.values().filter_map(|page| page.find(record_id));
        let first = copies.next()?;
        if first.description == description && copies.all(|t| t.description == description) {
            Some(first.clone())
        } else {
            None
        }
    }
}

// ==================== Tests ====================
