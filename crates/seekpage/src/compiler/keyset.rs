//! Seek-method predicate.
//!
//! For sort columns `c1..cn` and boundary values `v1..vn` the predicate is an
//! OR of clauses, most specific first:
//!
//! ```text
//! (c1 = v1 AND ... AND cn >= vn) OR ... OR (c1 = v1 AND c2 > v2) OR (c1 > v1)
//! ```
//!
//! Only the full-length clause honours `inclusive`; the shorter ones are always
//! strict. Directions follow each column's sort order and flip for `Prev`.

use crate::cursor::{Cursor, Direction};
use crate::dialect::Dialect;
use crate::error::{PageError, PageResult};
use crate::order::{OrderBy, SortDir};
use crate::params::{BindParam, EXPANSION_SEPARATOR, ParamType, Params, normalize_scalar};

/// Bind-name prefix reserved for cursor values (`cursor__0`, `cursor__1`, ...).
pub const CURSOR_PARAM_PREFIX: &str = "cursor";

pub(crate) fn cursor_param_name(index: usize) -> String {
    format!("{CURSOR_PARAM_PREFIX}{EXPANSION_SEPARATOR}{index}")
}

/// Whether `name` falls in the reserved cursor bind namespace.
pub(crate) fn is_cursor_param(name: &str) -> bool {
    name.strip_prefix(CURSOR_PARAM_PREFIX)
        .is_some_and(|rest| rest.starts_with(EXPANSION_SEPARATOR))
}

fn seek_cmp_op(dir: SortDir, direction: Direction, inclusive: bool) -> &'static str {
    let ascending = match direction {
        Direction::Next => dir == SortDir::Asc,
        Direction::Prev => dir == SortDir::Desc,
    };
    match (ascending, inclusive) {
        (true, false) => ">",
        (true, true) => ">=",
        (false, false) => "<",
        (false, true) => "<=",
    }
}

/// A rendered seek predicate and its cursor binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetPredicate {
    sql: String,
    clauses: usize,
    params: Params,
}

impl KeysetPredicate {
    /// Predicate text, clauses joined by ` OR `.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Cursor bind parameters (`cursor__i`).
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Predicate safe to AND with another condition.
    pub fn grouped(&self) -> String {
        if self.clauses > 1 {
            format!("({})", self.sql)
        } else {
            self.sql.clone()
        }
    }

    pub(crate) fn into_params(self) -> Params {
        self.params
    }
}

/// Build the seek predicate for `cursor` under `order_by`.
pub(crate) fn build(
    dialect: Dialect,
    order_by: &OrderBy,
    cursor: &Cursor,
) -> PageResult<KeysetPredicate> {
    if !cursor.matches(order_by) {
        let have: Vec<&str> = cursor.values().keys().map(String::as_str).collect();
        let want: Vec<&str> = order_by.expressions().collect();
        return Err(PageError::invalid_cursor(format!(
            "cursor columns {have:?} do not match ORDER BY {want:?}"
        )));
    }

    let mut params = Params::new();
    let mut binds = Vec::with_capacity(order_by.len());
    for (i, (expr, value)) in cursor.values().iter().enumerate() {
        let name = cursor_param_name(i);
        let value = normalize_scalar(dialect, &name, value)
            .map_err(|e| PageError::invalid_cursor(format!("'{expr}': {e}")))?;
        if value.param_type() == ParamType::Null {
            return Err(PageError::invalid_cursor(format!(
                "NULL value for '{expr}' cannot bound a keyset page"
            )));
        }
        params.insert(name.clone(), BindParam::new(name.clone(), value));
        binds.push(name);
    }

    let items: Vec<_> = order_by.iter().collect();
    let n = items.len();
    let direction = cursor.direction();
    let clauses: Vec<String> = (1..=n)
        .rev()
        .map(|k| {
            let mut parts: Vec<String> = items[..k - 1]
                .iter()
                .zip(&binds)
                .map(|(item, bind)| format!("{} = :{bind}", item.expr()))
                .collect();
            let last = items[k - 1];
            let op = seek_cmp_op(last.dir(), direction, k == n && cursor.inclusive());
            parts.push(format!("{} {op} :{}", last.expr(), binds[k - 1]));
            format!("({})", parts.join(" AND "))
        })
        .collect();

    Ok(KeysetPredicate {
        sql: clauses.join(" OR "),
        clauses: n,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::Pager;
    use crate::params::BindValue;
    use crate::value::Value;

    fn cursor(order: &OrderBy, row: &[(&str, Value)]) -> Cursor {
        Cursor::create(order, &Pager::new(2, 10), row, None).unwrap()
    }

    #[test]
    fn single_column_has_no_or() {
        let order = OrderBy::new().asc("user_id").unwrap();
        let c = cursor(&order, &[("user_id", Value::Int(21))]);
        let p = build(Dialect::MySql, &order, &c).unwrap();
        assert_eq!(p.sql(), "(user_id >= :cursor__0)");
        assert_eq!(p.grouped(), "(user_id >= :cursor__0)");
        assert_eq!(p.params()["cursor__0"].value(), &BindValue::Int(21));
    }

    #[test]
    fn multi_column_emits_longest_clause_first() {
        let order = OrderBy::new().desc("gender").unwrap().asc("user_id").unwrap();
        let c = cursor(&order, &[("gender", Value::Int(2)), ("user_id", Value::Int(21))]);
        let p = build(Dialect::MySql, &order, &c).unwrap();
        assert_eq!(
            p.sql(),
            "(gender = :cursor__0 AND user_id >= :cursor__1) OR (gender < :cursor__0)"
        );
        assert_eq!(p.params().len(), 2);
        assert!(p.grouped().starts_with("((gender"));
    }

    #[test]
    fn three_columns_use_strict_prefix_clauses() {
        let order = OrderBy::new()
            .asc("a")
            .unwrap()
            .asc("b")
            .unwrap()
            .desc("c")
            .unwrap();
        let row = [("a", Value::Int(1)), ("b", Value::Int(2)), ("c", Value::Int(3))];
        let c = cursor(&order, &row).with_inclusive(false);
        let p = build(Dialect::Sqlite, &order, &c).unwrap();
        assert_eq!(
            p.sql(),
            "(a = :cursor__0 AND b = :cursor__1 AND c < :cursor__2) \
             OR (a = :cursor__0 AND b > :cursor__1) OR (a > :cursor__0)"
        );
    }

    #[test]
    fn prev_mirrors_every_operator() {
        for dir in [SortDir::Asc, SortDir::Desc] {
            for inclusive in [false, true] {
                let next = seek_cmp_op(dir, Direction::Next, inclusive);
                let prev = seek_cmp_op(dir, Direction::Prev, inclusive);
                let mirrored = next.replace('>', "#").replace('<', ">").replace('#', "<");
                assert_eq!(prev, mirrored);
            }
        }
    }

    #[test]
    fn rejects_mismatched_or_null_cursors() {
        let order = OrderBy::new().asc("user_id").unwrap();
        let other = OrderBy::new().asc("id").unwrap();
        let c = cursor(&order, &[("user_id", Value::Int(1))]);
        assert!(build(Dialect::MySql, &other, &c).unwrap_err().is_invalid_cursor());

        let null = cursor(&order, &[("user_id", Value::Null)]);
        assert!(build(Dialect::MySql, &order, &null).unwrap_err().is_invalid_cursor());
    }

    #[test]
    fn cursor_namespace() {
        assert!(is_cursor_param("cursor__0"));
        assert!(is_cursor_param("cursor__x"));
        assert!(!is_cursor_param("cursor"));
        assert!(!is_cursor_param("cursor_0"));
        assert!(!is_cursor_param("my_cursor__0"));
    }
}
