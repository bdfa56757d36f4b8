//! Transaction store contract and the in-memory implementation

use async_trait::async_trait;
use std::cmp::Ordering;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::TransactionRecord;

/// Persistent store for transactions.
///
/// Every call is scoped to one user; rows of other users are invisible.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Rows `[offset, offset + limit)` ordered by date descending, plus the
    /// caller's total row count.
    async fn select_page(
        &self,
        user_id: &str,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<TransactionRecord>, u64), StoreError>;

    /// Replace one row's description and return the updated row
    async fn update_description(
        &self,
        user_id: &str,
        id: &str,
        description: &str,
    ) -> Result<TransactionRecord, StoreError>;
}

/// Display order: newest date first, then newest insert, then id
pub fn display_order(a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Store backed by a vector kept in display order
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RwLock<Vec<TransactionRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TransactionRecord>) -> Self {
        let mut rows = records;
        rows.sort_by(display_order);
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Add rows, keeping display order
    pub async fn insert_many(&self, records: Vec<TransactionRecord>) -> usize {
        let count = records.len();
        let mut rows = self.rows.write().await;
        rows.extend(records);
        rows.sort_by(display_order);
        count
    }

    /// Remove every row owned by `user_id`
    pub async fn clear_user(&self, user_id: &str) -> usize {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|t| t.user_id != user_id);
        before - rows.len()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<TransactionRecord> {
        self.rows.read().await.iter().find(|t| t.id == id).cloned()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn select_page(
        &self,
        user_id: &str,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<TransactionRecord>, u64), StoreError> {
        let rows = self.rows.read().await;
        let owned: Vec<&TransactionRecord> = rows.iter().filter(|t| t.user_id == user_id).collect();
        let total = owned.len() as u64;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let page = owned
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update_description(
        &self,
        user_id: &str,
        id: &str,
        description: &str,
    ) -> Result<TransactionRecord, StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        if row.user_id != user_id {
            // Same answer as a missing row, ids of other users are not disclosed
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        row.description = description.to_string();
        log::debug!("store: description of {} updated", id);
        Ok(row.clone())
    }
}
