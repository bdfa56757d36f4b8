//! Presentation state of the caller's dashboard (JSON)
//!
//! Reads only: these never trigger a fetch, they report what the cache
//! and the edit tracker currently hold.

use axum::extract::{Path, State};
use axum::Json;
use ledgerdash_core::{EditStatus, PageView};

use crate::{ApiError, AppState, AuthUser};

/// What the table would draw for `page` right now
pub async fn api_page_view(
    State(state): State<AppState>,
    user: AuthUser,
    Path(page): Path<u32>,
) -> Json<PageView> {
    Json(state.dashboard_for(&user.user_id).page_view(page))
}

/// Status of the latest inline edit of one record
pub async fn api_edit_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EditStatus>, ApiError> {
    state
        .dashboard_for(&user.user_id)
        .edit_status(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            resource: format!("edit of {}", id),
        })
}
