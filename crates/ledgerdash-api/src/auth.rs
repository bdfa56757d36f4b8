//! HTTP Basic authentication against the configured users

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ledgerdash_config::Config;
use ledgerdash_core::identity::format_auth_error;
use ledgerdash_core::AuthError;

use crate::{is_htmx_request, ApiError, AppState};

/// The signed-in caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub user_id: String,
}

fn rejected(message: &str) -> AuthError {
    AuthError::Rejected {
        message: message.to_string(),
    }
}

/// Resolve the caller from an `Authorization: Basic ...` header
pub fn authenticate(headers: &HeaderMap, config: &Config) -> Result<AuthUser, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingIdentity)?
        .to_str()
        .map_err(|_| rejected("Malformed authorization header"))?;

    let encoded = value
        .strip_prefix("Basic ")
        .ok_or_else(|| rejected("Unsupported authorization scheme"))?;
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| rejected(&format!("Malformed credentials: {}", e)))?;
    let credentials =
        String::from_utf8(decoded).map_err(|_| rejected("Malformed credentials"))?;
    let (username, password) = credentials
        .split_once(':')
        .ok_or_else(|| rejected("Malformed credentials"))?;

    match config.user(username) {
        Some(user) if user.password == password => Ok(AuthUser {
            username: user.username.clone(),
            user_id: user.user_id.clone(),
        }),
        _ => {
            log::warn!("auth: rejected credentials for {:?}", username);
            Err(rejected("Invalid username or password"))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.config).map_err(|e| {
            ApiError::unauthorized(format_auth_error(&e)).for_htmx(is_htmx_request(&parts.headers))
        })
    }
}
