//! Offset pagination and page-number windows.

use serde::{Deserialize, Serialize};

/// A clamped page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Build a request from untrusted input.
    ///
    /// `page` is clamped to at least 1 and `per_page` into `1..=max_per_page`.
    /// Missing values fall back to page 1 and `default_per_page`.
    #[must_use]
    pub fn new(
        page: Option<i64>,
        per_page: Option<i64>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let per_page = per_page
            .unwrap_or_else(|| i64::from(default_per_page))
            .clamp(1, i64::from(max_per_page.max(1)));
        Self {
            page: u32::try_from(page).unwrap_or(1),
            per_page: u32::try_from(per_page).unwrap_or(1),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Rows to skip, for SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Rows per page, for SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Number of pages needed for `total` rows (0 when there are none).
#[must_use]
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX)
}

/// A page of results plus the counts needed to render navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            per_page: request.per_page(),
            total_pages: total_pages(total, request.per_page()),
        }
    }

    /// 1-based index of the first row on this page (0 when empty).
    #[must_use]
    pub fn first_row(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            u64::from(self.page - 1) * u64::from(self.per_page) + 1
        }
    }

    /// 1-based index of the last row on this page (0 when empty).
    #[must_use]
    pub fn last_row(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            self.first_row() + self.items.len() as u64 - 1
        }
    }
}

/// One slot in a pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Number(u32),
    Ellipsis,
}

/// Page numbers to show for `current` out of `total` pages.
///
/// Up to seven pages are all listed. Beyond that the bar shows the first
/// page, the current page with one neighbour each side, and the last page,
/// with an ellipsis wherever numbers are skipped.
#[must_use]
pub fn page_window(current: u32, total: u32) -> Vec<PageSlot> {
    if total <= 7 {
        return (1..=total).map(PageSlot::Number).collect();
    }

    let range_start = current.saturating_sub(1).max(2);
    let range_end = current.saturating_add(1).min(total - 1);

    let mut slots = vec![PageSlot::Number(1)];
    if range_start > 2 {
        slots.push(PageSlot::Ellipsis);
    }
    slots.extend((range_start..=range_end).map(PageSlot::Number));
    if range_end < total - 1 {
        slots.push(PageSlot::Ellipsis);
    }
    slots.push(PageSlot::Number(total));
    slots
}
