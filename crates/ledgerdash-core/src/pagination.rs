//! Page arithmetic and the page-number strip shown under the table

use serde::{Deserialize, Serialize};

/// Pages shown without collapsing into ellipses
const MAX_UNCOLLAPSED_PAGES: u32 = 7;

/// `ceil(total_count / page_size)`; zero rows means zero pages
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Offset of the first row of a 1-based page
pub fn page_offset(page: u32, page_size: u32) -> u64 {
    (page.saturating_sub(1) as u64) * page_size as u64
}

/// Number of rows a page holds given the collection size
pub fn rows_on_page(total_count: u64, page: u32, page_size: u32) -> u64 {
    total_count
        .saturating_sub(page_offset(page, page_size))
        .min(page_size as u64)
}

/// Entry in the pagination strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "page", rename_all = "lowercase")]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

/// Page numbers to render around `current`.
///
/// Up to seven pages are listed in full. Past that the first and last page
/// are always present, the neighbours of `current` are shown, and gaps
/// collapse into an ellipsis. A single page needs no strip at all.
pub fn page_window(current: u32, total_pages: u32) -> Vec<PageLink> {
    if total_pages <= 1 {
        return Vec::new();
    }
    if total_pages <= MAX_UNCOLLAPSED_PAGES {
        return (1..=total_pages).map(PageLink::Page).collect();
    }

    let current = current.clamp(1, total_pages);
    let mut links = vec![PageLink::Page(1)];

    if current > 3 {
        links.push(PageLink::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total_pages - 1);
    for page in start..=end {
        links.push(PageLink::Page(page));
    }

    if current < total_pages - 2 {
        links.push(PageLink::Ellipsis);
    }
    links.push(PageLink::Page(total_pages));

    links
}
