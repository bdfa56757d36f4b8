//! Route modules for the API server
//!
//! - transactions: JSON page reads and edits, HTMX table and inline editor
//! - dashboard: JSON view of the caller's cached page and edit state
//!
//! transactions follows the split used for larger modules:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: full page and fragment rendering

pub mod dashboard;
pub mod transactions;

/// `?page=N` (default 1), optional `page_size` for JSON callers
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}
