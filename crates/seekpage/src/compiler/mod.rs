//! Pagination compiler.
//!
//! [`Compiler::compile`] turns a base statement into a paginated one:
//!
//! - without a cursor: `... ORDER BY ... LIMIT {limit} OFFSET {offset}`
//! - with a cursor: the seek predicate is ANDed into the statement and the
//!   window starts at the boundary row (`OFFSET 0`)
//!
//! The limit always carries one probe row past the pages the focus window
//! needs, so "has next" is known without counting.
//!
//! # Example
//!
//! ```ignore
//! use seekpage::{Compiler, Dialect, OrderBy, Pager, ParamList};
//!
//! let order = OrderBy::new().desc("user_id")?;
//! let q = Compiler::new(Dialect::MySql).compile(
//!     "SELECT * FROM user WHERE gender IN (:gender)",
//!     &order,
//!     &ParamList::new().bind("gender", vec![1, 2]),
//!     &Pager::new(3, 10),
//!     None,
//! )?;
//! assert_eq!(
//!     q.sql(),
//!     "SELECT * FROM user WHERE gender IN (:gender__0, :gender__1) \
//!      ORDER BY user_id DESC LIMIT 11 OFFSET 20"
//! );
//! ```

mod keyset;
mod window;


pub use keyset::{CURSOR_PARAM_PREFIX, KeysetPredicate};
pub use window::{Mode, Window, effective_pages};

use crate::cursor::{Cursor, Direction};
use crate::dialect::Dialect;
use crate::error::{PageError, PageResult};
use crate::order::OrderBy;
use crate::pager::Pager;
use crate::params::{ParamList, Params, normalize};
use crate::sql::{self, Edits, Statement};

/// Alias of the derived table wrapped by [`Compiler::count_query`].
pub const COUNT_ALIAS: &str = "seekpage_count";

#[cfg(feature = "tracing")]
const MAX_LOGGED_SQL: usize = 200;

/// A paginated statement ready for a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    sql: String,
    params: Params,
    window: Window,
}

impl CompiledQuery {
    /// Paginated SQL with named `:placeholders`.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind parameters in order (statement params, then cursor params).
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The fetched row window.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Split into SQL, parameters and window.
    pub fn into_parts(self) -> (String, Params, Window) {
        (self.sql, self.params, self.window)
    }
}

/// `SELECT COUNT(*)` over a base statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    sql: String,
    params: Params,
}

impl CountQuery {
    /// Counting SQL with named `:placeholders`.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind parameters of the base statement.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Pagination compiler for one dialect.
///
/// Compilation is pure: the same inputs always produce byte-identical output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Compiler {
    dialect: Dialect,
}

impl Compiler {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Compile `sql` for the page described by `pager`, seeking from `cursor`
    /// when one is given.
    ///
    /// The base statement must not carry its own top-level `LIMIT`, `OFFSET`,
    /// `FETCH` or set operator, nor an `ORDER BY` when `order_by` is non-empty.
    pub fn compile(
        &self,
        sql: &str,
        order_by: &OrderBy,
        params: &ParamList,
        pager: &Pager,
        cursor: Option<&Cursor>,
    ) -> PageResult<CompiledQuery> {
        let normalized = normalize(self.dialect, params)?;
        let stmt = Statement::parse(sql, self.dialect)?;
        stmt.ensure_pageable(!order_by.is_empty())?;

        let mut edits = Edits::new();
        sql::push_expansions(&stmt, &normalized.expansions, &mut edits)?;
        let mut bound = normalized.params;

        let (window, order) = match cursor {
            None => (
                Window::offset_mode(pager.page(), pager.size(), pager.each_side())?,
                None,
            ),
            Some(cursor) => {
                check_cursor_namespace(&stmt, &bound)?;
                let predicate = keyset::build(self.dialect, order_by, cursor)?;
                stmt.push_predicate(&predicate.grouped(), &mut edits)?;
                bound.extend(predicate.into_params());

                let window = Window::keyset_mode(
                    pager.page(),
                    pager.size(),
                    cursor.each_side(),
                    cursor.direction(),
                )?;
                let order = match cursor.direction() {
                    Direction::Next => None,
                    Direction::Prev => Some(order_by.reversed()),
                };
                (window, order)
            }
        };

        let mut tail = String::new();
        order.as_ref().unwrap_or(order_by).append_to_sql(&mut tail);
        tail.push_str(&format!(" LIMIT {} OFFSET {}", window.limit, window.offset));
        edits.insert(stmt.tail_offset()?, tail);

        let compiled = CompiledQuery {
            sql: edits.apply(sql, stmt.body_end()),
            params: bound,
            window,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "seekpage.compile",
            dialect = %self.dialect,
            mode = ?compiled.window.mode,
            page = compiled.window.page,
            limit = compiled.window.limit,
            offset = compiled.window.offset,
            param_count = compiled.params.len(),
            sql = %sql::truncate_sql_bytes(&compiled.sql, MAX_LOGGED_SQL),
            "compiled pagination query"
        );

        Ok(compiled)
    }

    /// The seek predicate `cursor` produces under `order_by`, unspliced.
    pub fn keyset_predicate(
        &self,
        order_by: &OrderBy,
        cursor: &Cursor,
    ) -> PageResult<KeysetPredicate> {
        keyset::build(self.dialect, order_by, cursor)
    }

    /// Wrap `sql` as `SELECT COUNT(*) FROM (...) AS seekpage_count`.
    ///
    /// Collection parameters are expanded as in [`Compiler::compile`]; the
    /// statement may keep its own `ORDER BY`/`LIMIT`.
    pub fn count_query(&self, sql: &str, params: &ParamList) -> PageResult<CountQuery> {
        let normalized = normalize(self.dialect, params)?;
        let stmt = Statement::parse(sql, self.dialect)?;
        let mut edits = Edits::new();
        sql::push_expansions(&stmt, &normalized.expansions, &mut edits)?;
        let inner = edits.apply(sql, stmt.body_end());
        Ok(CountQuery {
            sql: format!("SELECT COUNT(*) FROM ({inner}) AS {COUNT_ALIAS}"),
            params: normalized.params,
        })
    }
}

/// Compile with a throwaway [`Compiler`].
pub fn compile(
    dialect: Dialect,
    sql: &str,
    order_by: &OrderBy,
    params: &ParamList,
    pager: &Pager,
    cursor: Option<&Cursor>,
) -> PageResult<CompiledQuery> {
    Compiler::new(dialect).compile(sql, order_by, params, pager, cursor)
}

fn check_cursor_namespace(stmt: &Statement<'_>, params: &Params) -> PageResult<()> {
    let clash = params
        .keys()
        .map(String::as_str)
        .chain(sql::placeholder_names(stmt))
        .find(|name| keyset::is_cursor_param(name));
    match clash {
        Some(name) => Err(PageError::ParamCollision(format!(
            "':{name}' is reserved for cursor values"
        ))),
        None => Ok(()),
    }
}
