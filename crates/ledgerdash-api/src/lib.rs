//! HTTP API server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::transactions: JSON page reads and edits, the HTMX table and
//!   its inline description editor
//! - routes::dashboard: presentation state of the caller's cached pages

pub mod auth;
pub mod error;
pub mod routes;

use axum::{
    http::{HeaderMap, Method},
    response::{IntoResponse, Redirect},
    routing::{get, put},
    Router,
};
use ledgerdash_config::Config;
use ledgerdash_core::{Dashboard, FixedIdentity, InMemoryStore, StoreClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use auth::AuthUser;
pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub config: Arc<Config>,
    /// One dashboard (and so one page cache) per signed-in user id
    dashboards: Arc<Mutex<HashMap<String, Arc<Dashboard>>>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            dashboards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store client acting as `user_id`
    pub fn client_for(&self, user_id: &str) -> StoreClient {
        StoreClient::new(self.store.clone(), Arc::new(FixedIdentity::user(user_id)))
    }

    pub fn dashboard_for(&self, user_id: &str) -> Arc<Dashboard> {
        let mut dashboards = self.dashboards.lock().unwrap_or_else(PoisonError::into_inner);
        dashboards
            .entry(user_id.to_string())
            .or_insert_with(|| {
                log::debug!("creating dashboard for {}", user_id);
                Arc::new(Dashboard::for_client(
                    user_id,
                    self.config.pagination.page_size,
                    self.client_for(user_id),
                ))
            })
            .clone()
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::dashboard::{api_edit_status, api_page_view};
    use routes::transactions::{
        api_transactions, api_update_description, htmx_transactions_list,
        htmx_update_description, page_dashboard,
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers(Any)
        .allow_origin(Any);

    let api = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/transactions", get(api_transactions))
        .route("/api/transactions/:id/description", put(api_update_description))
        .route("/api/dashboard/pages/:page", get(api_page_view))
        .route("/api/dashboard/edits/:id", get(api_edit_status))
        .layer(cors);

    Router::new()
        .merge(api)
        // HTMX page routes
        .route("/", get(index_page))
        .route("/login", get(login))
        .route("/dashboard", get(page_dashboard))
        // HTMX partial routes
        .route("/transactions/list", get(htmx_transactions_list))
        .route("/transactions/:id/description", put(htmx_update_description))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn index_page() -> Redirect {
    Redirect::to("/dashboard")
}

/// Browsers land here after an auth failure; the 401 from the extractor
/// makes them prompt for credentials.
async fn login(_user: AuthUser) -> impl IntoResponse {
    Redirect::to("/dashboard")
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Ledgerdash</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css">
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
        .htmx-request#transactions-content table {{ opacity: 0.5; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        title, content
    )
}

/// Check if request is from HTMX (partial page update)
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for full page or HTMX partial
pub fn page_response(headers: &HeaderMap, title: &str, user: &AuthUser, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        format!("<main class='max-w-5xl mx-auto p-6'>{}</main>", inner_content)
    } else {
        base_html(
            title,
            &format!(
                r#"<header class='bg-white border-b'>
    <div class='max-w-5xl mx-auto px-6 py-4 flex items-center justify-between'>
        <h1 class='text-xl font-bold text-indigo-600'>Ledgerdash</h1>
        <span class='text-sm text-gray-500'>{}</span>
    </div>
</header>
<main class='max-w-5xl mx-auto p-6'>{}</main>"#,
                ledgerdash_utils::escape_html(&user.username),
                inner_content
            ),
        )
    }
}

/// Start the HTTP server and serve until Ctrl-C
pub async fn start_server(config: Config, store: Arc<InMemoryStore>) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let state = AppState::new(config, store);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting Ledgerdash server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - /dashboard (Transactions table)");
    log::info!("  - /api/transactions (JSON pages)");
    log::info!("  - /api/health");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
