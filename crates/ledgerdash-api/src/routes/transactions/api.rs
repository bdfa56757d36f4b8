//! Transactions API endpoints - JSON API and HTMX partial responses
//!
//! Endpoints:
//! - api_transactions: One page of the caller's transactions (JSON)
//! - api_update_description: Change one description in the store (JSON)
//! - htmx_transactions_list: Table for one page, served from the caller's cache (HTML fragment)
//! - htmx_update_description: Optimistic inline edit (HTML fragment)

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use axum::{Form, Json};
use ledgerdash_core::mutator::validate_description;
use ledgerdash_core::{EditError, FetchError, PageFetcher, PageResult, TransactionRecord, TransactionStore};
use serde::Deserialize;

use super::page::{render_load_error, render_row, render_table};
use crate::routes::PageQuery;
use crate::{is_htmx_request, ApiError, AppState, AuthUser};

#[derive(Debug, Deserialize)]
pub struct DescriptionBody {
    pub description: String,
}

/// Get one page of transactions (JSON API)
pub async fn api_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResult>, ApiError> {
    let page_size = query.page_size.unwrap_or(state.config.pagination.page_size);
    let result = state
        .client_for(&user.user_id)
        .fetch(query.page(), page_size)
        .await?;
    Ok(Json(result))
}

/// Update a description directly in the store (JSON API)
pub async fn api_update_description(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<DescriptionBody>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let description = validate_description(&body.description)?;
    let record = state
        .store
        .update_description(&user.user_id, &id, description)
        .await?;
    // pages cached for this caller still carry the old text
    state.dashboard_for(&user.user_id).cache().invalidate_all();
    log::info!("api: {} updated description of {}", user.username, id);
    Ok(Json(record))
}

/// HTMX: Transactions table for `?page=N`
pub async fn htmx_transactions_list(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ApiError> {
    let dashboard = state.dashboard_for(&user.user_id);
    let page = query.page();

    match dashboard.request_page(page).await {
        Ok(result) => Ok(Html(render_table(
            &result,
            &dashboard.page_links(page),
            &state.config.currency,
        ))),
        Err(FetchError::Unauthorized) => {
            Err(ApiError::from(FetchError::Unauthorized).for_htmx(is_htmx_request(&headers)))
        }
        Err(e) => Ok(Html(render_load_error(&e.to_string(), page))),
    }
}

/// HTMX: Inline description edit, applied optimistically to every cached page
///
/// Returns the confirmed row, or on failure the row as it was before the
/// edit with the error shown underneath.
pub async fn htmx_update_description(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(body): Form<DescriptionBody>,
) -> Result<Html<String>, ApiError> {
    let dashboard = state.dashboard_for(&user.user_id);
    let currency = &state.config.currency;

    match dashboard.commit_edit(&id, &body.description).await {
        Ok(record) => Ok(Html(render_row(&record, currency, None))),
        Err(EditError::Unauthorized) => {
            Err(ApiError::from(EditError::Unauthorized).for_htmx(is_htmx_request(&headers)))
        }
        Err(e) => match dashboard.cached_record(&id) {
            Some(current) => Ok(Html(render_row(&current, currency, Some(&e.to_string())))),
            None => Err(ApiError::from(e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use ledgerdash_config::{Config, DEMO_USER_ID};
    use ledgerdash_core::InMemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    // demo:demo
    const DEMO_AUTH: &str = "Basic ZGVtbzpkZW1v";

    async fn seeded_state(rows: usize) -> AppState {
        let config = Config::default();
        let store = Arc::new(InMemoryStore::new());
        let store_config = ledgerdash_config::StoreConfig {
            seed_count: Some(rows),
            seed_user_id: DEMO_USER_ID.to_string(),
            rng_seed: Some(5),
        };
        ledgerdash_core::seed::seed_store(&store, &store_config).await;
        AppState::new(config, store)
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, String) {
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, DEMO_AUTH)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = seeded_state(0).await;
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        assert_eq!(send(&state, request).await, (StatusCode::OK, "OK".to_string()));
    }

    #[tokio::test]
    async fn test_api_transactions_last_page() {
        let state = seeded_state(125).await;
        let (status, body) = send(&state, get("/api/transactions?page=13")).await;
        assert_eq!(status, StatusCode::OK);

        let page: PageResult = serde_json::from_str(&body).unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_count, 125);
        assert_eq!(page.page, 13);
    }

    #[tokio::test]
    async fn test_api_requires_credentials() {
        let state = seeded_state(5).await;
        let request = Request::builder()
            .uri("/api/transactions")
            .header("hx-request", "true")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(response.headers()["hx-redirect"], "/login");
    }

    #[tokio::test]
    async fn test_api_invalid_page() {
        let state = seeded_state(5).await;
        let (status, _) = send(&state, get("/api/transactions?page=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_update_description() {
        let state = seeded_state(12).await;
        let (_, body) = send(&state, get("/api/transactions?page=1")).await;
        let page: PageResult = serde_json::from_str(&body).unwrap();
        let id = page.items[0].id.clone();

        let put = |text: &str| {
            Request::builder()
                .method("PUT")
                .uri(format!("/api/transactions/{}/description", id))
                .header(header::AUTHORIZATION, DEMO_AUTH)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::json!({ "description": text }).to_string()))
                .unwrap()
        };

        let (status, _) = send(&state, put("   ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&state, put("  Rent  ")).await;
        assert_eq!(status, StatusCode::OK);
        let record: TransactionRecord = serde_json::from_str(&body).unwrap();
        assert_eq!(record.description, "Rent");
        assert_eq!(state.store.get(&id).await.unwrap().description, "Rent");
    }

    #[tokio::test]
    async fn test_api_update_refreshes_cached_list() {
        let state = seeded_state(12).await;
        let dashboard = state.dashboard_for(DEMO_USER_ID);
        let id = dashboard.request_page(1).await.unwrap().items[0].id.clone();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/transactions/{}/description", id))
            .header(header::AUTHORIZATION, DEMO_AUTH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"description":"Quarterly rent"}"#))
            .unwrap();
        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(dashboard.cache().is_stale(ledgerdash_core::PageKey { page: 1, page_size: 10 }));

        let (status, body) = send(&state, get("/transactions/list?page=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Quarterly rent"));
    }

    #[tokio::test]
    async fn test_api_update_unknown_record() {
        let state = seeded_state(3).await;
        let request = Request::builder()
            .method("PUT")
            .uri("/api/transactions/missing/description")
            .header(header::AUTHORIZATION, DEMO_AUTH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"description":"x"}"#))
            .unwrap();
        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_htmx_list_and_inline_edit() {
        let state = seeded_state(25).await;
        let (status, body) = send(&state, get("/transactions/list?page=3")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Showing 21 to 25 of 25"));

        let dashboard = state.dashboard_for(DEMO_USER_ID);
        let id = dashboard.request_page(3).await.unwrap().items[0].id.clone();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/transactions/{}/description", id))
            .header(header::AUTHORIZATION, DEMO_AUTH)
            .header("hx-request", "true")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("description=Team+lunch"))
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Team lunch"));
        assert_eq!(state.store.get(&id).await.unwrap().description, "Team lunch");
        assert!(dashboard.cache().is_stale(ledgerdash_core::PageKey { page: 3, page_size: 10 }));
    }

    #[tokio::test]
    async fn test_htmx_edit_blank_description_is_rejected() {
        let state = seeded_state(5).await;
        let dashboard = state.dashboard_for(DEMO_USER_ID);
        let id = dashboard.request_page(1).await.unwrap().items[0].id.clone();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/transactions/{}/description", id))
            .header(header::AUTHORIZATION, DEMO_AUTH)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("description=+++"))
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Description cannot be empty"));
    }
}
