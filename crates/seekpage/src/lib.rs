//! # seekpage
//!
//! A pagination query compiler for raw SQL.
//!
//! ## Features
//!
//! - **Offset pagination**: `ORDER BY ... LIMIT ... OFFSET ...` appended to your statement
//! - **Keyset pagination**: seek-method predicates from a stored boundary row, no large offsets
//! - **No counting needed**: one probe row past the look-ahead pages tells whether more exist
//! - **Array parameters**: `IN (:ids)` expands to one placeholder per element
//! - **Dialect aware**: temporal bind values formatted for MySQL, SQLite or PostgreSQL
//! - **Fail closed**: statements the scanner cannot splice safely are rejected, never guessed
//!
//! ## Offset pages
//!
//! ```ignore
//! use seekpage::{Compiler, Dialect, OrderBy, Pager, ParamList, Paginator};
//!
//! let order = OrderBy::new().desc("user_id")?;
//! let pager = Pager::new(3, 10).with_each_side(2);
//! let q = Compiler::new(Dialect::MySql).compile(
//!     "SELECT * FROM user WHERE gender IN (:gender)",
//!     &order,
//!     &ParamList::new().bind("gender", vec![1, 2]),
//!     &pager,
//!     None,
//! )?;
//!
//! let rows = run(q.sql(), q.params())?;
//! let page = Paginator::from_window(rows, q.window(), None)?;
//! for n in page.focus_pages() { /* render links */ }
//! ```
//!
//! ## Keyset pages
//!
//! ```ignore
//! use seekpage::{Cursor, MemoryCursorStore};
//!
//! let store = MemoryCursorStore::new();
//! let pager = Pager::new(1, 10).with_cursor_name("users");
//! // ... fetch page 1, then remember the first row of page 2:
//! Cursor::create(&order, &pager.next(1), &rows[10], None)?.save(&store)?;
//!
//! // next request
//! let cursor = Cursor::load(&store, "users")?;
//! let q = compiler.compile(sql, &order, &params, &pager.next(1), cursor.as_ref())?;
//! ```
//!
//! [`paginate`] runs the whole round trip against a [`Driver`].

pub mod compiler;
pub mod config;
pub mod cursor;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod order;
pub mod pager;
pub mod paginator;
pub mod params;
pub mod value;

mod sql;

pub use compiler::{
    COUNT_ALIAS, CURSOR_PARAM_PREFIX, CompiledQuery, Compiler, CountQuery, KeysetPredicate, Mode,
    Window, compile, effective_pages,
};
pub use config::{DEFAULT_PAGE_SIZE, PagerConfig};
pub use cursor::{
    BoundaryRow, Cursor, CursorStore, DEFAULT_CURSOR_TTL, Direction, MemoryCursorStore,
};
pub use dialect::{Dialect, Temporal, TemporalFormatter};
pub use driver::{Driver, PageRequest, paginate, paginate_offset};
pub use error::{PageError, PageResult};
pub use order::{OrderBy, OrderItem, SortDir};
pub use pager::Pager;
pub use paginator::{PageMeta, Paginator, PaginatorArgs};
pub use params::{BindParam, BindValue, ParamList, ParamType, Params, normalize};
pub use value::{BackedValue, Value};

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PgDriver;
