//! Transactions page rendering - Full page and fragments
//!
//! Endpoints:
//! - page_dashboard: Dashboard page with the transactions table
//!
//! Helper functions:
//! - render_table: Table, range label and page strip for one page
//! - render_row: One row with its inline description editor
//! - render_load_error: Error panel with a retry button

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use ledgerdash_config::CurrencyConfig;
use ledgerdash_core::{FetchError, PageLink, PageResult, TransactionRecord};
use ledgerdash_utils::{escape_html, format_currency_places, format_date};

use crate::routes::PageQuery;
use crate::{is_htmx_request, page_response, ApiError, AppState, AuthUser};

/// Dashboard page - transactions table for `?page=N`
pub async fn page_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ApiError> {
    let dashboard = state.dashboard_for(&user.user_id);
    let page = query.page();

    let table = match dashboard.request_page(page).await {
        Ok(result) => render_table(&result, &dashboard.page_links(page), &state.config.currency),
        Err(FetchError::Unauthorized) => {
            return Err(ApiError::from(FetchError::Unauthorized).for_htmx(is_htmx_request(&headers)))
        }
        Err(e) => render_load_error(&e.to_string(), page),
    };

    let inner_content = format!(
        r#"<div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold'>Transactions</h2>
            <span class='htmx-indicator text-sm text-gray-500' id='table-indicator'>Loading...</span>
        </div>
        <div class='bg-white rounded-xl shadow-sm overflow-hidden'>{}</div>"#,
        table
    );

    Ok(Html(page_response(&headers, "Dashboard", &user, &inner_content)))
}

/// Element id for a row: the record id's bytes as lowercase hex, so any
/// id yields a valid selector and distinct ids never collide
fn row_dom_id(record_id: &str) -> String {
    record_id
        .bytes()
        .fold(String::from("tx-"), |mut id, b| {
            id.push_str(&format!("{:02x}", b));
            id
        })
}

/// One table row; `error` is shown under the description after a failed edit
pub fn render_row(record: &TransactionRecord, currency: &CurrencyConfig, error: Option<&str>) -> String {
    let dom_id = row_dom_id(&record.id);
    let amount_class = if record.is_income() { "text-green-600" } else { "text-red-600" };
    let error_html = error
        .map(|message| {
            format!(
                "<p class='text-xs text-red-600 mt-1'>{}</p>",
                escape_html(message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<tr id='{dom_id}' class='border-b hover:bg-gray-50'>
    <td class='px-4 py-2 whitespace-nowrap text-sm text-gray-600'>{date}</td>
    <td class='px-4 py-2'>
        <form hx-put='/transactions/{id}/description' hx-target='#{dom_id}' hx-swap='outerHTML'>
            <input type='text' name='description' value='{description}'
                class='w-full px-2 py-1 border border-transparent rounded hover:border-gray-300 focus:border-indigo-500'>
        </form>{error_html}
    </td>
    <td class='px-4 py-2 text-sm text-gray-500 font-mono'>{account}</td>
    <td class='px-4 py-2 text-right font-medium {amount_class}'>{amount}</td>
</tr>"#,
        dom_id = dom_id,
        date = format_date(record.date),
        id = urlencoding::encode(&record.id),
        description = escape_html(&record.description),
        error_html = error_html,
        account = escape_html(&record.account_number),
        amount_class = amount_class,
        amount = format_currency_places(record.amount, &currency.code, currency.decimal_places),
    )
}

fn render_page_strip(result: &PageResult, links: &[PageLink]) -> String {
    if links.is_empty() {
        return String::new();
    }
    let button = |page: u32, label: &str, enabled: bool, current: bool| {
        let class = if current {
            "px-3 py-1 rounded bg-indigo-600 text-white"
        } else if enabled {
            "px-3 py-1 rounded border hover:bg-gray-50"
        } else {
            "px-3 py-1 rounded border text-gray-300 cursor-not-allowed"
        };
        if enabled && !current {
            format!(
                "<button hx-get='/transactions/list?page={}' hx-target='#transactions-content' hx-swap='outerHTML' hx-indicator='#table-indicator' class='{}'>{}</button>",
                page, class, label
            )
        } else {
            format!("<button disabled class='{}'>{}</button>", class, label)
        }
    };

    let mut strip = String::from("<div class='flex items-center gap-1'>");
    strip.push_str(&button(result.page.saturating_sub(1), "Previous", result.has_previous(), false));
    for link in links {
        match link {
            PageLink::Page(n) => strip.push_str(&button(*n, &n.to_string(), true, *n == result.page)),
            PageLink::Ellipsis => strip.push_str("<span class='px-2 text-gray-400'>...</span>"),
        }
    }
    strip.push_str(&button(result.page + 1, "Next", result.has_next(), false));
    strip.push_str("</div>");
    strip
}

/// Table fragment swapped into `#transactions-content`
pub fn render_table(result: &PageResult, links: &[PageLink], currency: &CurrencyConfig) -> String {
    let body = if result.is_empty() {
        "<tr><td colspan='4' class='px-4 py-8 text-center text-gray-500'>No transactions yet</td></tr>"
            .to_string()
    } else {
        result
            .items
            .iter()
            .map(|record| render_row(record, currency, None))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<div id='transactions-content'>
    <table class='w-full'>
        <thead class='bg-gray-50 text-left text-xs uppercase text-gray-500'>
            <tr><th class='px-4 py-2'>Date</th><th class='px-4 py-2'>Description</th><th class='px-4 py-2'>Account</th><th class='px-4 py-2 text-right'>Amount</th></tr>
        </thead>
        <tbody>{}</tbody>
    </table>
    <div class='flex items-center justify-between px-4 py-3 border-t text-sm'>
        <span class='text-gray-600'>{}</span>
        {}
    </div>
</div>"#,
        body,
        result.range_label(),
        render_page_strip(result, links)
    )
}

/// Error panel replacing the table; the button retries the same page
pub fn render_load_error(message: &str, page: u32) -> String {
    format!(
        r#"<div id='transactions-content' class='p-6 text-center'>
    <p class='text-red-600 mb-3'>{}</p>
    <button hx-get='/transactions/list?page={}' hx-target='#transactions-content' hx-swap='outerHTML'
        class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Retry</button>
</div>"#,
        escape_html(message),
        page
    )
}
