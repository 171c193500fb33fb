//! Structured ORDER BY.
//!
//! An [`OrderBy`] is an ordered list of `(expression, direction)` pairs. The
//! order drives both the emitted `ORDER BY` clause and the keyset tie-break
//! priority (first item = highest priority).

use crate::error::{PageError, PageResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    /// SQL keyword.
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }

    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

impl FromStr for SortDir {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDir::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDir::Desc)
        } else {
            Err(PageError::invalid_argument(format!(
                "unknown sort direction '{s}'"
            )))
        }
    }
}

/// A single ORDER BY item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    expr: String,
    dir: SortDir,
}

impl OrderItem {
    /// Column or expression text.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Sort direction.
    pub fn dir(&self) -> SortDir {
        self.dir
    }
}

/// ORDER BY clause.
///
/// # Example
/// ```ignore
/// use seekpage::{OrderBy, SortDir};
///
/// let order = OrderBy::new().desc("gender")?.asc("user_id")?;
/// assert_eq!(order.to_sql(), "ORDER BY gender DESC, user_id ASC");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    items: Vec<OrderItem>,
}

impl OrderBy {
    /// Create a new empty OrderBy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(expression, direction)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> PageResult<Self>
    where
        I: IntoIterator<Item = (S, SortDir)>,
        S: Into<String>,
    {
        pairs
            .into_iter()
            .try_fold(Self::new(), |order, (expr, dir)| order.push(expr, dir))
    }

    /// Add an ascending sort.
    pub fn asc(self, expr: impl Into<String>) -> PageResult<Self> {
        self.push(expr, SortDir::Asc)
    }

    /// Add a descending sort.
    pub fn desc(self, expr: impl Into<String>) -> PageResult<Self> {
        self.push(expr, SortDir::Desc)
    }

    /// Add a sort item. Expressions must be non-empty and unique.
    pub fn push(mut self, expr: impl Into<String>, dir: SortDir) -> PageResult<Self> {
        let expr = expr.into().trim().to_string();
        if expr.is_empty() {
            return Err(PageError::invalid_argument("empty ORDER BY expression"));
        }
        if expr.contains(';') {
            return Err(PageError::invalid_argument(format!(
                "ORDER BY expression '{expr}' contains ';'"
            )));
        }
        if self.contains(&expr) {
            return Err(PageError::invalid_argument(format!(
                "duplicate ORDER BY expression '{expr}'"
            )));
        }
        self.items.push(OrderItem { expr, dir });
        Ok(self)
    }

    /// Check if this OrderBy is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate items in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter()
    }

    /// Expressions in priority order.
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.expr.as_str())
    }

    /// Whether `expr` is one of the sort expressions.
    pub fn contains(&self, expr: &str) -> bool {
        self.items.iter().any(|i| i.expr == expr)
    }

    /// Direction for `expr`, if present.
    pub fn dir_of(&self, expr: &str) -> Option<SortDir> {
        self.items.iter().find(|i| i.expr == expr).map(|i| i.dir)
    }

    /// The same expressions with every direction flipped.
    pub fn reversed(&self) -> Self {
        Self {
            items: self
                .items
                .iter()
                .map(|i| OrderItem {
                    expr: i.expr.clone(),
                    dir: i.dir.reverse(),
                })
                .collect(),
        }
    }

    /// Append ` ORDER BY ...` to `sql`. Does nothing if empty.
    pub fn append_to_sql(&self, sql: &mut String) {
        if self.items.is_empty() {
            return;
        }
        sql.push(' ');
        sql.push_str(&self.to_sql());
    }

    /// Build the ORDER BY clause as a string (empty if there are no items).
    pub fn to_sql(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let items: Vec<String> = self
            .items
            .iter()
            .map(|i| format!("{} {}", i.expr, i.dir.to_sql()))
            .collect();
        format!("ORDER BY {}", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_insertion_order() {
        let order = OrderBy::new()
            .desc("gender")
            .unwrap()
            .asc("user_id")
            .unwrap()
            .desc("created_at")
            .unwrap();
        assert_eq!(
            order.to_sql(),
            "ORDER BY gender DESC, user_id ASC, created_at DESC"
        );
    }

    #[test]
    fn empty_renders_nothing() {
        let mut sql = String::from("SELECT 1");
        OrderBy::new().append_to_sql(&mut sql);
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn rejects_duplicates_and_blanks() {
        let err = OrderBy::new().asc("id").unwrap().desc("id").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(OrderBy::new().asc("  ").is_err());
        assert!(OrderBy::new().asc("id; DROP TABLE x").is_err());
    }

    #[test]
    fn reversed_flips_every_direction() {
        let order = OrderBy::from_pairs([("a", SortDir::Asc), ("b", SortDir::Desc)]).unwrap();
        assert_eq!(order.reversed().to_sql(), "ORDER BY a DESC, b ASC");
        assert_eq!(order.dir_of("b"), Some(SortDir::Desc));
        assert_eq!(order.dir_of("c"), None);
    }

    #[test]
    fn parses_sort_dir() {
        assert_eq!("DESC".parse::<SortDir>().unwrap(), SortDir::Desc);
        assert_eq!("asc".parse::<SortDir>().unwrap(), SortDir::Asc);
        assert!("up".parse::<SortDir>().is_err());
    }
}
