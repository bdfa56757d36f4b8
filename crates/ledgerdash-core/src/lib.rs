//! Paginated transaction cache with optimistic description edits
//!
//! The pieces, bottom-up:
//!
//! - [`store::TransactionStore`] is the remote row store (in memory here).
//! - [`fetcher::PageFetcher`] turns a page request into a [`models::PageResult`]
//!   for the signed-in user.
//! - [`cache::PagedCache`] keeps one entry per page, shares concurrent
//!   fetches of the same page and drops responses that were superseded.
//! - [`mutator::OptimisticMutator`] applies an edit to every cached page
//!   at once, then commits or rolls it back when the store answers.
//! - [`dashboard::Dashboard`] is the per-user view the web layer talks to.

pub mod cache;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod models;
pub mod mutator;
pub mod pagination;
pub mod seed;
pub mod store;

#[cfg(test)]
mod testing;

pub use cache::{PageState, PagedCache};
pub use dashboard::{Dashboard, EditStatus, PageView};
pub use error::CoreError;
pub use error::ErrorSeverity;
pub use error::{AuthError, EditError, FetchError, StoreError};
pub use fetcher::{PageFetcher, StoreClient};
pub use identity::{FixedIdentity, IdentityGate};
pub use models::{PageKey, PageResult, TransactionRecord};
pub use mutator::{DescriptionUpdater, EditSnapshot, OptimisticMutator};
pub use pagination::{page_window, PageLink};
pub use store::{InMemoryStore, TransactionStore};
