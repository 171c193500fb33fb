//! Driver seam and page orchestration.
//!
//! The compiler never touches a database. A [`Driver`] executes the compiled
//! statement; [`paginate`] strings compile, fetch, optional count and
//! [`Paginator`] together, and keeps a cursor for the following page.

use crate::compiler::{CompiledQuery, Compiler};
use crate::cursor::{BoundaryRow, Cursor, CursorStore};
use crate::dialect::Dialect;
use crate::error::PageResult;
use crate::order::OrderBy;
use crate::pager::Pager;
use crate::paginator::Paginator;
use crate::params::{ParamList, Params};
use std::future::Future;

/// Executes compiled statements.
///
/// Statements use named `:placeholders`; implementations bind `params` by
/// name (or rewrite to positional placeholders) as their database requires.
pub trait Driver: Send + Sync {
    type Row: Send;

    /// Run a query and return all rows.
    fn execute(
        &self,
        dialect: Dialect,
        sql: &str,
        params: &Params,
    ) -> impl Future<Output = PageResult<Vec<Self::Row>>> + Send;

    /// Run a `SELECT COUNT(*)` query and return the count.
    fn count(
        &self,
        dialect: Dialect,
        sql: &str,
        params: &Params,
    ) -> impl Future<Output = PageResult<i64>> + Send;
}

/// A page request against a base statement.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub sql: &'a str,
    pub order_by: &'a OrderBy,
    pub params: &'a ParamList,
    pub pager: &'a Pager,
}

impl<'a> PageRequest<'a> {
    pub fn new(
        sql: &'a str,
        order_by: &'a OrderBy,
        params: &'a ParamList,
        pager: &'a Pager,
    ) -> Self {
        Self {
            sql,
            order_by,
            params,
            pager,
        }
    }
}

/// Fetch one page with offset pagination only.
pub async fn paginate_offset<D: Driver>(
    driver: &D,
    dialect: Dialect,
    request: PageRequest<'_>,
) -> PageResult<Paginator<D::Row>> {
    let compiled = Compiler::new(dialect).compile(
        request.sql,
        request.order_by,
        request.params,
        request.pager,
        None,
    )?;
    let rows = driver
        .execute(dialect, compiled.sql(), compiled.params())
        .await?;
    let total = fetch_total(driver, dialect, &request).await?;
    Paginator::from_window(rows, compiled.window(), total)
}

/// Fetch one page, seeking from the stored cursor when it still fits.
///
/// A stored cursor is used when its pager matches `request.pager` (all but
/// the page number), it targets the requested page and its columns match the
/// ORDER BY. Otherwise the page is fetched by offset. When more rows follow,
/// the first row of the next page is saved as the new cursor.
pub async fn paginate<D, S>(
    driver: &D,
    dialect: Dialect,
    request: PageRequest<'_>,
    store: &S,
) -> PageResult<Paginator<D::Row>>
where
    D: Driver,
    D::Row: BoundaryRow,
    S: CursorStore + ?Sized,
{
    let cursor = match request.pager.cursor_name() {
        Some(name) => load_usable_cursor(store, name, &request)?,
        None => None,
    };

    let compiled = Compiler::new(dialect).compile(
        request.sql,
        request.order_by,
        request.params,
        request.pager,
        cursor.as_ref(),
    )?;
    let rows = driver
        .execute(dialect, compiled.sql(), compiled.params())
        .await?;

    if request.pager.use_cursor() {
        save_next_cursor(store, &compiled, &rows, &request)?;
    }

    let total = fetch_total(driver, dialect, &request).await?;
    Paginator::from_window(rows, compiled.window(), total)
}

async fn fetch_total<D: Driver>(
    driver: &D,
    dialect: Dialect,
    request: &PageRequest<'_>,
) -> PageResult<Option<i64>> {
    if !request.pager.need_total() {
        return Ok(None);
    }
    let count = Compiler::new(dialect).count_query(request.sql, request.params)?;
    let total = driver.count(dialect, count.sql(), count.params()).await?;
    Ok(Some(total))
}

fn load_usable_cursor<S: CursorStore + ?Sized>(
    store: &S,
    name: &str,
    request: &PageRequest<'_>,
) -> PageResult<Option<Cursor>> {
    let Some(cursor) = Cursor::load(store, name)? else {
        return Ok(None);
    };
    let usable = cursor.pager().verify(Some(request.pager))
        && cursor.pager().page() == request.pager.page()
        && cursor.matches(request.order_by);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "seekpage.cursor",
        name,
        usable,
        page = request.pager.page(),
        "stored cursor checked"
    );

    Ok(usable.then_some(cursor))
}

fn save_next_cursor<S, R>(
    store: &S,
    compiled: &CompiledQuery,
    rows: &[R],
    request: &PageRequest<'_>,
) -> PageResult<()>
where
    S: CursorStore + ?Sized,
    R: BoundaryRow,
{
    let window = compiled.window();
    if window.is_reversed() || request.order_by.is_empty() {
        return Ok(());
    }
    let Ok(size) = usize::try_from(window.size()) else {
        return Ok(());
    };
    let Some(boundary) = rows.get(size) else {
        return Ok(());
    };
    let next = Cursor::create(
        request.order_by,
        &request.pager.next(1),
        boundary,
        None,
    )?;
    next.save(store)
}
