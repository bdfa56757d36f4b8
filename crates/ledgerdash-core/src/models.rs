//! Core data models for the transactions dashboard

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::pagination;

/// One row of the transactions table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Opaque unique identifier assigned by the store
    pub id: String,
    /// Owner of the row
    pub user_id: String,
    /// Booking date, no time component
    pub date: NaiveDate,
    /// Account the transaction was booked against (e.g., "CHK-001234")
    pub account_number: String,
    /// Free-text description, the only field editable from the dashboard
    pub description: String,
    /// Signed amount with two fractional digits
    pub amount: Decimal,
    /// Insert timestamp set by the store
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Build a record, normalizing the amount to two decimal places
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        date: NaiveDate,
        account_number: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        let mut amount = amount.round_dp(2);
        amount.rescale(2);
        Self {
            id: id.into(),
            user_id: user_id.into(),
            date,
            account_number: account_number.into(),
            description: description.into(),
            amount,
            created_at: Utc::now(),
        }
    }

    /// Money coming in
    pub fn is_income(&self) -> bool {
        !self.amount.is_sign_negative()
    }
}

/// Identifies one cached page: the page number and the size it was cut with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageKey {
    pub page: u32,
    pub page_size: u32,
}

impl PageKey {
    /// Validated key; pages are 1-based and sizes positive
    pub fn new(page: u32, page_size: u32) -> Result<Self, FetchError> {
        if page == 0 || page_size == 0 {
            return Err(FetchError::InvalidPage { page, page_size });
        }
        Ok(Self { page, page_size })
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> u64 {
        pagination::page_offset(self.page, self.page_size)
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} (size {})", self.page, self.page_size)
    }
}

/// One page of a server-paginated collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T = TransactionRecord> {
    /// Rows of this page, date descending
    pub items: Vec<T>,
    /// Rows across all pages at fetch time
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PageResult<T> {
    pub fn key(&self) -> PageKey {
        PageKey {
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total_count, self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// 1-based index of the first row shown, 0 for an empty page
    pub fn first_row(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            pagination::page_offset(self.page, self.page_size) + 1
        }
    }

    /// 1-based index of the last row shown
    pub fn last_row(&self) -> u64 {
        (pagination::page_offset(self.page, self.page_size) + self.items.len() as u64)
            .min(self.total_count)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PageResult<TransactionRecord> {
    pub fn find(&self, id: &str) -> Option<&TransactionRecord> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// "Showing 121 to 125 of 125"
    pub fn range_label(&self) -> String {
        format!(
            "Showing {} to {} of {}",
            self.first_row(),
            self.last_row(),
            self.total_count
        )
    }
}
