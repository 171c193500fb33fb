//! SQL text splicing.
//!
//! Pagination is applied to statements the compiler did not generate, so this
//! module never parses SQL. It scans the text (quote, comment and parenthesis
//! aware) and finds top-level clause boundaries:
//!
//! - `:name` placeholders of collection parameters become `:name__0, :name__1`
//! - a keyset predicate is ANDed into `WHERE`/`HAVING`, or a `WHERE` is added
//! - `ORDER BY`/`LIMIT`/`OFFSET` are appended at the end (before `FOR UPDATE`)
//!
//! Anything the scanner cannot place safely is rejected with
//! [`PageError::InsertionPoint`](crate::PageError::InsertionPoint).

mod scan;
mod splice;


pub(crate) use splice::{Edits, Statement};

use crate::error::{PageError, PageResult};
use scan::{Token, TokenKind};
use std::collections::HashMap;

#[cfg(feature = "postgres")]
use crate::dialect::Dialect;
#[cfg(feature = "postgres")]
use crate::params::{BindParam, Params};

/// Queue replacements for placeholders of expanded collection parameters.
///
/// An empty collection becomes the literal `NULL` so `IN (:ids)` stays valid.
/// `NOT IN (NULL)` matches no row at all, so an empty collection there is
/// rejected.
pub(crate) fn push_expansions(
    stmt: &Statement<'_>,
    expansions: &HashMap<String, Vec<String>>,
    edits: &mut Edits,
) -> PageResult<()> {
    let sql = stmt.sql();
    let tokens = stmt.tokens();
    for (i, token) in tokens.iter().enumerate() {
        let Some(name) = token.placeholder_name(sql) else {
            continue;
        };
        let Some(names) = expansions.get(name) else {
            continue;
        };
        let text = if names.is_empty() {
            if follows_not_in(sql, &tokens[..i]) {
                return Err(PageError::normalize(
                    name,
                    "empty collection in NOT IN (...) would match no rows",
                ));
            }
            "NULL".to_string()
        } else {
            names
                .iter()
                .map(|n| format!(":{n}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        edits.replace(token.start, token.end, text);
    }
    Ok(())
}

/// `before` ends with `NOT IN (`.
fn follows_not_in(sql: &str, before: &[Token]) -> bool {
    let is_word =
        |t: &Token, word: &str| t.kind == TokenKind::Word && t.text(sql).eq_ignore_ascii_case(word);
    match before {
        [.., not, keyword, open] => {
            open.kind == TokenKind::OpenParen && is_word(keyword, "IN") && is_word(not, "NOT")
        }
        _ => false,
    }
}

/// Names of all `:name` placeholders, in order of appearance.
pub(crate) fn placeholder_names<'a>(stmt: &Statement<'a>) -> Vec<&'a str> {
    let sql = stmt.sql();
    stmt.tokens()
        .iter()
        .filter_map(|t| t.placeholder_name(sql))
        .collect()
}

/// Rewrite named placeholders to `$1, $2, ...` and return the parameters in
/// positional order. A name used twice reuses its position.
#[cfg(feature = "postgres")]
pub(crate) fn to_positional<'p>(
    sql: &str,
    params: &'p Params,
) -> PageResult<(String, Vec<&'p BindParam>)> {
    let tokens = scan::tokenize(sql, Dialect::Postgres)?;
    let mut edits = Edits::new();
    let mut order: Vec<&'p BindParam> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for token in &tokens {
        let Some(name) = token.placeholder_name(sql) else {
            continue;
        };
        let position = match positions.get(name) {
            Some(&p) => p,
            None => {
                let param = params.get(name).ok_or_else(|| {
                    PageError::invalid_argument(format!("no value bound for ':{name}'"))
                })?;
                order.push(param);
                positions.insert(name, order.len());
                order.len()
            }
        };
        edits.replace(token.start, token.end, format!("${position}"));
    }

    Ok((edits.apply(sql, sql.len()), order))
}

/// Truncate to at most `max_bytes`, backing off to a char boundary.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
