//! Error types for ledgerdash-core
//!
//! Fetch and edit failures are kept in separate enums because they surface
//! in different places: a fetch error belongs to one page's state, an edit
//! error is handed back to whoever committed the edit. Both fold into
//! `CoreError` for code / severity / details reporting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Caller must sign in again
    Unauthorized,
    /// Store or network failure
    RemoteError,
    /// Page number or page size outside the valid range
    InvalidPage,
    /// Edited description was blank after trimming
    EmptyDescription,
    /// Record id unknown to the store
    TransactionNotFound,
    /// Store refused the operation for this caller
    PermissionDenied,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::RemoteError => write!(f, "REMOTE_ERROR"),
            ErrorCode::InvalidPage => write!(f, "INVALID_PAGE"),
            ErrorCode::EmptyDescription => write!(f, "EMPTY_DESCRIPTION"),
            ErrorCode::TransactionNotFound => write!(f, "TRANSACTION_NOT_FOUND"),
            ErrorCode::PermissionDenied => write!(f, "PERMISSION_DENIED"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Failure reported by the backing store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transaction not found: {id}")]
    NotFound { id: String },

    #[error("Permission denied")]
    PermissionDenied,

    #[error("{message}")]
    Unavailable { message: String },
}

/// Failure reported by the identity gate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    MissingIdentity,

    #[error("{message}")]
    Rejected { message: String },
}

/// Failure loading one page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Remote(String),

    #[error("Invalid page request: page {page}, page size {page_size}")]
    InvalidPage { page: u32, page_size: u32 },
}

impl From<StoreError> for FetchError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::PermissionDenied => FetchError::Unauthorized,
            other => FetchError::Remote(other.to_string()),
        }
    }
}

impl From<AuthError> for FetchError {
    fn from(_: AuthError) -> Self {
        FetchError::Unauthorized
    }
}

/// Failure committing a description edit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Description cannot be empty")]
    EmptyDescription,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Remote(String),
}

impl From<StoreError> for EditError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::PermissionDenied => EditError::Unauthorized,
            other => EditError::Remote(other.to_string()),
        }
    }
}

impl From<AuthError> for EditError {
    fn from(_: AuthError) -> Self {
        EditError::Unauthorized
    }
}

/// Main error type for ledgerdash-core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Fetch(FetchError::Unauthorized)
            | CoreError::Edit(EditError::Unauthorized)
            | CoreError::Auth(_) => ErrorCode::Unauthorized,
            CoreError::Fetch(FetchError::Remote(_))
            | CoreError::Edit(EditError::Remote(_))
            | CoreError::Store(StoreError::Unavailable { .. }) => ErrorCode::RemoteError,
            CoreError::Fetch(FetchError::InvalidPage { .. }) => ErrorCode::InvalidPage,
            CoreError::Edit(EditError::EmptyDescription) => ErrorCode::EmptyDescription,
            CoreError::Store(StoreError::NotFound { .. }) => ErrorCode::TransactionNotFound,
            CoreError::Store(StoreError::PermissionDenied) => ErrorCode::PermissionDenied,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.code() {
            ErrorCode::EmptyDescription | ErrorCode::InvalidPage => ErrorSeverity::Info,
            ErrorCode::Unauthorized
            | ErrorCode::PermissionDenied
            | ErrorCode::TransactionNotFound => ErrorSeverity::Warning,
            ErrorCode::RemoteError => ErrorSeverity::Error,
        }
    }

    /// Errors that should send the caller back to sign-in
    pub fn is_unauthorized(&self) -> bool {
        self.code() == ErrorCode::Unauthorized
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Fetch(FetchError::InvalidPage { page, page_size }) => details
                .with_detail(serde_json::json!({ "page": page, "page_size": page_size }))
                .with_suggestion("Pages are numbered from 1."),
            CoreError::Edit(EditError::EmptyDescription) => {
                details.with_suggestion("Enter some text, or press Escape to cancel.")
            }
            CoreError::Store(StoreError::NotFound { .. }) => {
                details.with_suggestion("The transaction may belong to another user.")
            }
            _ if self.is_unauthorized() => details.with_suggestion("Sign in again."),
            _ if self.code() == ErrorCode::RemoteError => {
                details.with_suggestion("Retry; nothing was changed.")
            }
            _ => details,
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// User the failing operation ran for
    pub user_id: Option<String>,
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            user_id: None,
            operation: operation.to_string(),
            data: serde_json::json!({}),
        }
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Error => log::error!(
                target: "ledgerdash::error",
                "[{}] {} - Operation: {} - User: {:?} - {}",
                error.code(),
                error,
                context.operation,
                context.user_id,
                context.data
            ),
            _ => log::warn!(
                target: "ledgerdash::error",
                "[{}] {} - Operation: {} - User: {:?} - {}",
                error.code(),
                error,
                context.operation,
                context.user_id,
                context.data
            ),
        }
    }
}

// ==================== Tests ====================
