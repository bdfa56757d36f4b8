//! Transaction routes - paged list and description edits
//!
//! Structure:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page and fragment rendering

pub mod api;
pub mod page;

pub use api::{
    api_transactions,
    api_update_description,
    htmx_transactions_list,
    htmx_update_description,
};

pub use page::page_dashboard;
