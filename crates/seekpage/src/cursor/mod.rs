//! Keyset cursors.
//!
//! A [`Cursor`] captures the sort-column values of a boundary row together with
//! the pager that produced it. Compiling with a cursor turns the statement into
//! a seek-method query (see [`Compiler`](crate::Compiler)).
//!
//! Cursors are persisted in a [`CursorStore`] keyed by the pager's cursor name,
//! and expire after a fixed TTL ([`DEFAULT_CURSOR_TTL`]). An expired cursor is
//! treated as absent.
//!
//! # Example
//! ```ignore
//! use seekpage::{Cursor, MemoryCursorStore, OrderBy, Pager};
//!
//! let order = OrderBy::new().asc("user_id")?;
//! let pager = Pager::new(1, 10).with_cursor_name("users");
//! let row = indexmap::indexmap! { "user_id".to_string() => 21.into() };
//!
//! let store = MemoryCursorStore::new();
//! let cursor = Cursor::create(&order, &pager, &row, None)?;
//! cursor.save(&store)?;
//! assert_eq!(Cursor::load(&store, "users")?, Some(cursor));
//! ```

mod store;

pub use store::{CursorStore, MemoryCursorStore};

use crate::error::{PageError, PageResult};
use crate::order::OrderBy;
use crate::pager::Pager;
use crate::value::Value;
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Lifetime of a cursor, counted from its creation.
pub const DEFAULT_CURSOR_TTL: Duration = Duration::from_secs(30 * 60);

/// Navigation direction of a keyset query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Rows after the boundary in sort order.
    #[default]
    Next,
    /// Rows before the boundary in sort order.
    Prev,
}

impl Direction {
    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Next => Direction::Prev,
            Direction::Prev => Direction::Next,
        }
    }
}

/// A row whose column values can seed a cursor.
pub trait BoundaryRow {
    /// Value of `column`, if the row has it.
    fn column_value(&self, column: &str) -> Option<Value>;
}

impl BoundaryRow for IndexMap<String, Value> {
    fn column_value(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl BoundaryRow for HashMap<String, Value> {
    fn column_value(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl BoundaryRow for BTreeMap<String, Value> {
    fn column_value(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl BoundaryRow for serde_json::Map<String, serde_json::Value> {
    fn column_value(&self, column: &str) -> Option<Value> {
        self.get(column).cloned().map(Value::from)
    }
}

impl BoundaryRow for serde_json::Value {
    fn column_value(&self, column: &str) -> Option<Value> {
        self.as_object().and_then(|o| o.column_value(column))
    }
}

impl BoundaryRow for [(&str, Value)] {
    fn column_value(&self, column: &str) -> Option<Value> {
        self.iter().find(|(k, _)| *k == column).map(|(_, v)| v.clone())
    }
}

impl<const N: usize> BoundaryRow for [(&str, Value); N] {
    fn column_value(&self, column: &str) -> Option<Value> {
        self.as_slice().column_value(column)
    }
}

/// Looks up `expr` in `row`, falling back to the unqualified column name for
/// `table.column` expressions.
fn lookup(row: &(impl BoundaryRow + ?Sized), expr: &str) -> Option<Value> {
    row.column_value(expr).or_else(|| {
        expr.rsplit_once('.')
            .and_then(|(_, column)| row.column_value(column))
    })
}

/// A captured seek position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursor {
    pager: Pager,
    values: IndexMap<String, Value>,
    each_side_snapshot: Option<i64>,
    direction: Direction,
    inclusive: bool,
    created_at: DateTime<Utc>,
}

impl Cursor {
    /// Capture the sort values of `row` for every expression of `order_by`.
    ///
    /// Domain wrappers are resolved to scalars. The cursor moves forward and
    /// includes the boundary row by default.
    pub fn create(
        order_by: &OrderBy,
        pager: &Pager,
        row: &(impl BoundaryRow + ?Sized),
        each_side_override: Option<i64>,
    ) -> PageResult<Self> {
        if order_by.is_empty() {
            return Err(PageError::invalid_cursor(
                "a cursor needs at least one ORDER BY expression",
            ));
        }

        let mut values = IndexMap::with_capacity(order_by.len());
        for expr in order_by.expressions() {
            let raw = lookup(row, expr).ok_or_else(|| {
                PageError::invalid_cursor(format!("boundary row has no value for '{expr}'"))
            })?;
            let value = raw
                .resolve_scalar()
                .map_err(|e| PageError::invalid_cursor(format!("'{expr}': {e}")))?;
            values.insert(expr.to_string(), value);
        }

        Ok(Self {
            pager: pager.clone(),
            values,
            each_side_snapshot: each_side_override.map(|n| n.max(0)),
            direction: Direction::Next,
            inclusive: true,
            created_at: Utc::now(),
        })
    }

    /// Pager at creation time.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Boundary values in ORDER BY priority order.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Look-ahead width captured at creation, if overridden.
    pub fn each_side_snapshot(&self) -> Option<i64> {
        self.each_side_snapshot
    }

    /// Effective look-ahead width: the snapshot, else the pager's.
    pub fn each_side(&self) -> i64 {
        self.each_side_snapshot
            .unwrap_or_else(|| self.pager.each_side())
    }

    /// Navigation direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the boundary row itself is part of the result.
    pub fn inclusive(&self) -> bool {
        self.inclusive
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Same position, other direction.
    ///
    /// The boundary row is the first row of the page a cursor points at, so
    /// moving `Next` includes it and moving `Prev` stops just before it. Call
    /// [`Cursor::with_inclusive`] afterwards to override.
    pub fn with_direction(&self, direction: Direction) -> Self {
        Self {
            direction,
            inclusive: direction == Direction::Next,
            ..self.clone()
        }
    }

    /// Same position, including or excluding the boundary row.
    pub fn with_inclusive(&self, inclusive: bool) -> Self {
        Self {
            inclusive,
            ..self.clone()
        }
    }

    /// Same position under another pager (e.g. after page navigation).
    pub fn with_pager(&self, pager: Pager) -> Self {
        Self {
            pager,
            ..self.clone()
        }
    }

    /// Whether the cursor is past [`DEFAULT_CURSOR_TTL`].
    pub fn expired(&self) -> bool {
        self.expired_at(Utc::now(), DEFAULT_CURSOR_TTL)
    }

    /// Whether the cursor is past `ttl` at `now`.
    pub fn expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        match self.created_at.checked_add_signed(ttl) {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Whether the cursor keys are exactly the expressions of `order_by`, in order.
    pub fn matches(&self, order_by: &OrderBy) -> bool {
        self.values.len() == order_by.len()
            && self.values.keys().map(String::as_str).eq(order_by.expressions())
    }

    /// Persist under the pager's cursor name.
    pub fn save(&self, store: &(impl CursorStore + ?Sized)) -> PageResult<()> {
        let name = self.pager.cursor_name().ok_or_else(|| {
            PageError::invalid_argument("cannot save a cursor whose pager has no cursor name")
        })?;
        store.save(name, self)
    }

    /// Load a cursor by name; `None` when absent or expired.
    pub fn load(store: &(impl CursorStore + ?Sized), name: &str) -> PageResult<Option<Self>> {
        store.load(name)
    }

    /// Encode as a JSON token.
    pub fn to_json(&self) -> PageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON token produced by [`Cursor::to_json`].
    pub fn from_json(token: &str) -> PageResult<Self> {
        Ok(serde_json::from_str(token)?)
    }
}

/// Equality ignores direction, inclusiveness and timestamps.
impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.pager == other.pager
            && self.values == other.values
            && self.each_side_snapshot == other.each_side_snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BackedValue;

    #[derive(Debug)]
    struct Gender(i64);

    impl BackedValue for Gender {
        fn scalar(&self) -> Value {
            Value::Int(self.0)
        }
    }

    fn order() -> OrderBy {
        OrderBy::new().desc("gender").unwrap().asc("user_id").unwrap()
    }

    #[test]
    fn create_captures_values_in_order_by_order() {
        let row = [
            ("user_id", Value::Int(21)),
            ("name", Value::from("x")),
            ("gender", Value::backed(Gender(2))),
        ];
        let cursor = Cursor::create(&order(), &Pager::new(1, 10), &row, None).unwrap();
        let keys: Vec<&str> = cursor.values().keys().map(String::as_str).collect();
        assert_eq!(keys, ["gender", "user_id"]);
        assert_eq!(cursor.values()["gender"], Value::Int(2));
        assert_eq!(cursor.direction(), Direction::Next);
        assert!(cursor.inclusive());
        assert!(cursor.matches(&order()));
    }

    #[test]
    fn create_falls_back_to_unqualified_column() {
        let order = OrderBy::new().asc("u.user_id").unwrap();
        let row = [("user_id", Value::Int(3))];
        let cursor = Cursor::create(&order, &Pager::new(1, 10), &row, None).unwrap();
        assert_eq!(cursor.values()["u.user_id"], Value::Int(3));
    }

    #[test]
    fn create_rejects_missing_or_collection_values() {
        let row = [("gender", Value::Int(1))];
        let err = Cursor::create(&order(), &Pager::new(1, 10), &row, None).unwrap_err();
        assert!(err.is_invalid_cursor());

        let row = [("gender", Value::from(vec![1, 2])), ("user_id", Value::Int(1))];
        assert!(Cursor::create(&order(), &Pager::new(1, 10), &row, None).is_err());
        assert!(Cursor::create(&OrderBy::new(), &Pager::new(1, 10), &row, None).is_err());
    }

    #[test]
    fn each_side_snapshot_overrides_pager() {
        let pager = Pager::new(1, 10).with_each_side(3);
        let row = [("gender", Value::Int(1)), ("user_id", Value::Int(1))];
        let plain = Cursor::create(&order(), &pager, &row, None).unwrap();
        assert_eq!(plain.each_side(), 3);
        let snap = Cursor::create(&order(), &pager, &row, Some(1)).unwrap();
        assert_eq!(snap.each_side_snapshot(), Some(1));
        assert_eq!(snap.each_side(), 1);
    }

    #[test]
    fn equality_ignores_timestamp_and_direction() {
        let row = [("gender", Value::Int(1)), ("user_id", Value::Int(1))];
        let a = Cursor::create(&order(), &Pager::new(1, 10), &row, None).unwrap();
        let mut b = a.with_direction(Direction::Prev).with_inclusive(false);
        b.created_at = a.created_at - TimeDelta::hours(1);
        assert_eq!(a, b);
        assert_ne!(a, a.with_pager(Pager::new(1, 20)));
    }

    #[test]
    fn expires_after_ttl() {
        let row = [("gender", Value::Int(1)), ("user_id", Value::Int(1))];
        let cursor = Cursor::create(&order(), &Pager::new(1, 10), &row, None).unwrap();
        let created = cursor.created_at();
        let ttl = Duration::from_secs(60);
        assert!(!cursor.expired_at(created + TimeDelta::seconds(59), ttl));
        assert!(cursor.expired_at(created + TimeDelta::seconds(60), ttl));
        assert!(!cursor.expired());
    }

    #[test]
    fn json_token_round_trips() {
        let row = [("gender", Value::Int(2)), ("user_id", Value::from("abc"))];
        let cursor = Cursor::create(&order(), &Pager::new(2, 10), &row, Some(2))
            .unwrap()
            .with_direction(Direction::Prev);
        let token = cursor.to_json().unwrap();
        let back = Cursor::from_json(&token).unwrap();
        assert_eq!(back, cursor);
        assert_eq!(back.direction(), Direction::Prev);
        assert!(!back.inclusive());
        assert!(Cursor::from_json("{not json").is_err());
    }

    #[test]
    fn direction_sets_default_inclusiveness() {
        let row = [("gender", Value::Int(1)), ("user_id", Value::Int(1))];
        let next = Cursor::create(&order(), &Pager::new(3, 10), &row, None).unwrap();
        assert!(next.inclusive());

        let prev = next.with_direction(Direction::Prev);
        assert!(!prev.inclusive());
        assert!(prev.with_direction(Direction::Next).inclusive());
        assert!(prev.with_inclusive(true).inclusive());
    }
}
