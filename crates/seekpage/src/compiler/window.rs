use crate::cursor::Direction;
use crate::error::{PageError, PageResult};
use serde::{Deserialize, Serialize};

/// How a compiled query pages through rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `LIMIT`/`OFFSET` from the page number.
    Offset,
    /// Seek predicate from a cursor, `OFFSET 0`.
    Keyset,
}

/// Pages that must be fetched so the focus window around `page` is known.
///
/// The window spans `each_side` pages on both sides; near page 1 it shifts
/// right, so the pages missing on the left are needed on the right instead.
/// Always at least 1 (the current page).
pub fn effective_pages(page: i64, each_side: i64) -> i64 {
    let page = page.max(1);
    let each_side = each_side.max(0);
    let shift = each_side.saturating_add(1).saturating_sub(page).max(0);
    each_side.saturating_add(shift).max(1)
}

/// The row window a compiled query fetches.
///
/// `limit` is always `effective_pages * size + 1`: the extra probe row tells
/// whether more rows exist past the fetched pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub(crate) page: i64,
    pub(crate) size: i64,
    pub(crate) each_side: i64,
    pub(crate) effective_pages: i64,
    pub(crate) direction: Direction,
    pub(crate) offset: i64,
    pub(crate) limit: i64,
    pub(crate) mode: Mode,
}

impl Window {
    pub(crate) fn offset_mode(page: i64, size: i64, each_side: i64) -> PageResult<Self> {
        let effective_pages = effective_pages(page, each_side);
        let offset = (page - 1)
            .checked_mul(size)
            .ok_or_else(|| out_of_range(page, size, each_side))?;
        Ok(Self {
            page,
            size,
            each_side,
            effective_pages,
            direction: Direction::Next,
            offset,
            limit: probe_limit(page, size, each_side, effective_pages)?,
            mode: Mode::Offset,
        })
    }

    pub(crate) fn keyset_mode(
        page: i64,
        size: i64,
        each_side: i64,
        direction: Direction,
    ) -> PageResult<Self> {
        // Walking backwards only the pages before the boundary matter.
        let effective_pages = match direction {
            Direction::Next => effective_pages(page, each_side),
            Direction::Prev => each_side.max(1),
        };
        Ok(Self {
            page,
            size,
            each_side,
            effective_pages,
            direction,
            offset: 0,
            limit: probe_limit(page, size, each_side, effective_pages)?,
            mode: Mode::Keyset,
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn each_side(&self) -> i64 {
        self.each_side
    }

    /// Pages covered by `limit`, probe row excluded.
    pub fn effective_pages(&self) -> i64 {
        self.effective_pages
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Rows arrive in reverse sort order (backward keyset fetch).
    pub fn is_reversed(&self) -> bool {
        self.mode == Mode::Keyset && self.direction == Direction::Prev
    }
}

/// `effective_pages * size + 1`.
fn probe_limit(page: i64, size: i64, each_side: i64, effective_pages: i64) -> PageResult<i64> {
    effective_pages
        .checked_mul(size)
        .and_then(|rows| rows.checked_add(1))
        .ok_or_else(|| out_of_range(page, size, each_side))
}

fn out_of_range(page: i64, size: i64, each_side: i64) -> PageError {
    PageError::invalid_argument(format!(
        "page {page} of size {size} with each_side {each_side} is out of range"
    ))
}
