//! Error types for ledgerdash-api

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledgerdash_core::{EditError, FetchError, StoreError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// `htmx` marks requests made by htmx, which get a login redirect header
    #[error("{message}")]
    Unauthorized { message: String, htmx: bool },

    #[error("Permission denied")]
    Forbidden,

    #[error("{message}")]
    Upstream { message: String },

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            htmx: false,
        }
    }

    /// Same error, flagged for an htmx caller
    pub fn for_htmx(self, htmx: bool) -> Self {
        match self {
            ApiError::Unauthorized { message, .. } => ApiError::Unauthorized { message, htmx },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Unauthorized => ApiError::unauthorized("Unauthorized"),
            FetchError::InvalidPage { .. } => ApiError::BadRequest {
                message: error.to_string(),
            },
            FetchError::Remote(message) => ApiError::Upstream { message },
        }
    }
}

impl From<EditError> for ApiError {
    fn from(error: EditError) -> Self {
        match error {
            EditError::EmptyDescription => ApiError::BadRequest {
                message: error.to_string(),
            },
            EditError::Unauthorized => ApiError::unauthorized("Unauthorized"),
            EditError::Remote(message) => ApiError::Upstream { message },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => ApiError::NotFound {
                resource: error.to_string(),
            },
            StoreError::PermissionDenied => ApiError::Forbidden,
            StoreError::Unavailable { message } => ApiError::Upstream { message },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        let mut response = (status, body).into_response();

        if let ApiError::Unauthorized { htmx, .. } = &self {
            let headers = response.headers_mut();
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="ledgerdash""#),
            );
            if *htmx {
                headers.insert("hx-redirect", HeaderValue::from_static("/login"));
            }
        }
        if status.is_server_error() {
            log::error!("request failed: {}", self);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_status() {
        assert_eq!(ApiError::from(FetchError::Unauthorized).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(FetchError::InvalidPage { page: 0, page_size: 10 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(EditError::EmptyDescription).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(EditError::Remote("network error".into())),
            ApiError::Upstream { message: "network error".into() }
        );
        assert_eq!(
            ApiError::from(StoreError::NotFound { id: "tx-1".into() }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::from(StoreError::PermissionDenied), ApiError::Forbidden);
    }

    #[test]
    fn test_unauthorized_response_headers() {
        let response = ApiError::unauthorized("Unauthorized").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert!(!response.headers().contains_key("hx-redirect"));

        let response = ApiError::unauthorized("Unauthorized").for_htmx(true).into_response();
        assert_eq!(response.headers()["hx-redirect"], "/login");
    }
}
