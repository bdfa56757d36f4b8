//! Page fetching: one page of rows plus the total count, no caching

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::FetchError;
use crate::identity::IdentityGate;
use crate::models::{PageKey, PageResult};
use crate::pagination::rows_on_page;
use crate::store::TransactionStore;

/// Loads exactly one page from the remote side.
///
/// No retries at this layer; callers decide whether to ask again.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<PageResult, FetchError>;
}

/// Remote client for one caller: store access gated by an identity
#[derive(Clone)]
pub struct StoreClient {
    pub(crate) store: Arc<dyn TransactionStore>,
    pub(crate) identity: Arc<dyn IdentityGate>,
}

impl StoreClient {
    pub fn new(store: Arc<dyn TransactionStore>, identity: Arc<dyn IdentityGate>) -> Self {
        Self { store, identity }
    }
}

#[async_trait]
impl PageFetcher for StoreClient {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<PageResult, FetchError> {
        let key = PageKey::new(page, page_size)?;
        let user_id = self.identity.current_user()?;

        let (items, total_count) = self
            .store
            .select_page(&user_id, key.offset(), key.page_size)
            .await?;

        let expected = rows_on_page(total_count, key.page, key.page_size);
        if items.len() as u64 > expected {
            return Err(FetchError::Remote(format!(
                "store returned {} rows for {}, at most {} expected",
                items.len(),
                key,
                expected
            )));
        }

        Ok(PageResult {
            items,
            total_count,
            page: key.page,
            page_size: key.page_size,
        })
    }
}
