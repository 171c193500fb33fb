//! Page navigation facts over fetched rows.
//!
//! A [`Paginator`] works either from a known total row count or, without
//! counting, from the number of pages known to follow the current one (the
//! "probe" mode fed by the extra rows a compiled query fetches).

use crate::compiler::Window;
use crate::error::{PageError, PageResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Placeholder substituted by [`Paginator::url`].
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Inputs to [`Paginator::new`]. At least one of `total` and
/// `next_page_count` must be set; `total` wins when both are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginatorArgs {
    pub each_side: i64,
    pub page_size: i64,
    pub page: i64,
    pub total: Option<i64>,
    pub next_page_count: Option<i64>,
}

/// Serializable summary of a page, for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: Option<i64>,
    pub last_page: Option<i64>,
    pub from: i64,
    pub to: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub focus_pages: Vec<i64>,
}

/// One page of items plus navigation facts.
///
/// # Example
/// ```ignore
/// use seekpage::{Paginator, PaginatorArgs};
///
/// let p = Paginator::new(
///     vec!["a", "b"],
///     PaginatorArgs { each_side: 2, page_size: 2, page: 3, total: Some(11), next_page_count: None },
/// )?;
/// assert_eq!(p.last_page(), Some(6));
/// assert_eq!(p.focus_pages(), vec![1, 2, 3, 4, 5]);
/// assert_eq!(p.url("/users?page={page}", 4), "/users?page=4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator<T> {
    items: Vec<T>,
    each_side: i64,
    page_size: i64,
    page: i64,
    total: Option<i64>,
    last_page: Option<i64>,
    next_page_count: i64,
}

impl<T> Paginator<T> {
    pub fn new(items: Vec<T>, args: PaginatorArgs) -> PageResult<Self> {
        if args.page_size < 1 {
            return Err(PageError::invalid_argument(format!(
                "page_size must be >= 1, got {}",
                args.page_size
            )));
        }
        let mut page = args.page.max(1);
        let each_side = args.each_side.max(0);

        let (last_page, next_page_count) = match (args.total, args.next_page_count) {
            (Some(total), _) if total < 0 => {
                return Err(PageError::invalid_argument(format!(
                    "total must be >= 0, got {total}"
                )));
            }
            (Some(total), _) => {
                let last = div_ceil(total, args.page_size).max(1);
                page = page.min(last);
                (Some(last), last - page)
            }
            (None, Some(next)) => (None, next.max(0)),
            (None, None) => {
                return Err(PageError::invalid_argument(
                    "either total or next_page_count is required",
                ));
            }
        };

        Ok(Self {
            items,
            each_side,
            page_size: args.page_size,
            page,
            total: args.total,
            last_page,
            next_page_count,
        })
    }

    /// Interpret rows fetched for a compiled [`Window`].
    ///
    /// Rows past the current page only count towards the pages that follow
    /// (capped by the window's effective pages) and are dropped. Backward
    /// keyset rows are put back in natural order; the page they were fetched
    /// from is the only one known to follow.
    pub fn from_window(mut rows: Vec<T>, window: &Window, total: Option<i64>) -> PageResult<Self> {
        let size = window.size().max(1);
        let keep = usize::try_from(size)
            .map_err(|_| PageError::invalid_argument(format!("page size {size} out of range")))?;
        let fetched = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        let extra = (fetched - size).max(0);
        let probed = div_ceil(extra, size).min(window.effective_pages());

        rows.truncate(keep);
        let next_page_count = if window.is_reversed() {
            rows.reverse();
            1
        } else {
            probed
        };

        Self::new(
            rows,
            PaginatorArgs {
                each_side: window.each_side(),
                page_size: size,
                page: window.page(),
                total,
                next_page_count: Some(next_page_count),
            },
        )
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current page, clamped to the last page when the total is known.
    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn each_side(&self) -> i64 {
        self.each_side
    }

    pub fn total(&self) -> Option<i64> {
        self.total
    }

    /// Last page number, known only with a total.
    pub fn last_page(&self) -> Option<i64> {
        self.last_page
    }

    /// Pages known to follow the current one.
    pub fn next_page_count(&self) -> i64 {
        self.next_page_count
    }

    pub fn has_next(&self) -> bool {
        self.next_page_count > 0
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn on_first_page(&self) -> bool {
        self.page == 1
    }

    pub fn on_last_page(&self) -> bool {
        !self.has_next()
    }

    pub fn has_total(&self) -> bool {
        self.total.is_some()
    }

    pub fn has_last_page(&self) -> bool {
        self.last_page.is_some()
    }

    /// More than one page exists.
    pub fn has_pages(&self) -> bool {
        self.has_prev() || self.has_next()
    }

    pub fn next_page(&self) -> Option<i64> {
        self.page.checked_add(1).filter(|_| self.has_next())
    }

    pub fn prev_page(&self) -> Option<i64> {
        self.has_prev().then(|| self.page - 1)
    }

    /// 1-based position of the first item, 0 when the page is empty.
    pub fn from(&self) -> i64 {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1)
                .saturating_mul(self.page_size)
                .saturating_add(1)
        }
    }

    /// 1-based position of the last item, 0 when the page is empty.
    pub fn to(&self) -> i64 {
        if self.items.is_empty() {
            0
        } else {
            let len = i64::try_from(self.items.len()).unwrap_or(i64::MAX);
            self.from().saturating_add(len - 1)
        }
    }

    /// Pages around the current one: `each_side` on both sides, shifted to
    /// stay within `1..=last` where "last" is the last page or the furthest
    /// page known to follow.
    pub fn focus_range(&self) -> RangeInclusive<i64> {
        let upper = self
            .last_page
            .unwrap_or_else(|| self.page.saturating_add(self.next_page_count));
        let mut start = self.page.saturating_sub(self.each_side);
        let mut end = self.page.saturating_add(self.each_side);
        if start < 1 {
            end = end.saturating_add(1 - start);
            start = 1;
        }
        if end > upper {
            start = start.saturating_sub(end - upper).max(1);
            end = upper;
        }
        start..=end
    }

    pub fn focus_pages(&self) -> Vec<i64> {
        self.focus_range().collect()
    }

    /// Substitute `page` for `{page}` in `template`.
    pub fn url(&self, template: &str, page: i64) -> String {
        template.replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// `(page, url)` for every page of the focus window.
    pub fn page_urls(&self, template: &str) -> Vec<(i64, String)> {
        self.focus_range()
            .map(|p| (p, self.url(template, p)))
            .collect()
    }

    pub fn next_url(&self, template: &str) -> Option<String> {
        self.next_page().map(|p| self.url(template, p))
    }

    pub fn prev_url(&self, template: &str) -> Option<String> {
        self.prev_page().map(|p| self.url(template, p))
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta {
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            last_page: self.last_page,
            from: self.from(),
            to: self.to(),
            has_prev: self.has_prev(),
            has_next: self.has_next(),
            focus_pages: self.focus_pages(),
        }
    }

    /// Convert the items, keeping the navigation facts.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginator<U> {
        Paginator {
            items: self.items.into_iter().map(f).collect(),
            each_side: self.each_side,
            page_size: self.page_size,
            page: self.page,
            total: self.total,
            last_page: self.last_page,
            next_page_count: self.next_page_count,
        }
    }
}

/// `ceil(n / d)` for `n >= 0`, `d >= 1`.
fn div_ceil(n: i64, d: i64) -> i64 {
    n / d + i64::from(n % d != 0)
}
