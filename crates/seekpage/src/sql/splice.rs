//! Top-level clause layout and text edits.

use super::scan::{Token, TokenKind, tokenize};
use crate::dialect::Dialect;
use crate::error::{PageError, PageResult};

/// Top-level clauses relevant to splicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Clause {
    Where,
    GroupBy,
    Having,
    Window,
    OrderBy,
    Limit,
    Offset,
    Fetch,
    /// `FOR UPDATE`, `FOR SHARE`, `LOCK IN SHARE MODE`.
    Locking,
    /// `UNION`, `INTERSECT`, `EXCEPT`, `MINUS`.
    SetOp,
}

impl Clause {
    fn label(self) -> &'static str {
        match self {
            Clause::Where => "WHERE",
            Clause::GroupBy => "GROUP BY",
            Clause::Having => "HAVING",
            Clause::Window => "WINDOW",
            Clause::OrderBy => "ORDER BY",
            Clause::Limit => "LIMIT",
            Clause::Offset => "OFFSET",
            Clause::Fetch => "FETCH",
            Clause::Locking => "locking clause",
            Clause::SetOp => "set operator",
        }
    }
}

/// Clauses a new `WHERE` must precede.
const AFTER_WHERE: &[Clause] = &[
    Clause::GroupBy,
    Clause::Having,
    Clause::Window,
    Clause::OrderBy,
    Clause::Limit,
    Clause::Offset,
    Clause::Fetch,
    Clause::Locking,
];

/// A clause keyword found at depth 0. `first..=last` are token indexes
/// (`ORDER BY` spans two tokens).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marker {
    pub clause: Clause,
    pub first: usize,
    pub last: usize,
}

/// A tokenized single statement with its top-level clause markers.
#[derive(Debug)]
pub(crate) struct Statement<'a> {
    sql: &'a str,
    tokens: Vec<Token>,
    markers: Vec<Marker>,
}

impl<'a> Statement<'a> {
    /// Tokenize `sql`, drop trailing `;` and locate top-level clauses.
    pub fn parse(sql: &'a str, dialect: Dialect) -> PageResult<Self> {
        let mut tokens = tokenize(sql, dialect)?;
        while tokens.last().is_some_and(|t| t.kind == TokenKind::Semicolon) {
            tokens.pop();
        }
        if tokens.is_empty() {
            return Err(PageError::insertion_point("statement is empty"));
        }
        if let Some(semi) = tokens.iter().find(|t| t.kind == TokenKind::Semicolon) {
            return Err(PageError::insertion_point(format!(
                "multiple statements are not supported (';' at byte {})",
                semi.start
            )));
        }

        let markers = find_markers(sql, &tokens);
        Ok(Self {
            sql,
            tokens,
            markers,
        })
    }

    pub fn sql(&self) -> &'a str {
        self.sql
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Byte offset just past the last statement token (trailing `;` excluded).
    pub fn body_end(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.end)
    }

    pub fn find(&self, clause: Clause) -> Option<Marker> {
        self.markers.iter().copied().find(|m| m.clause == clause)
    }

    /// Fail unless `ORDER BY`/`LIMIT`/`OFFSET` can be appended.
    pub fn ensure_pageable(&self, adds_order_by: bool) -> PageResult<()> {
        let mut rejected = vec![Clause::SetOp, Clause::Limit, Clause::Offset, Clause::Fetch];
        if adds_order_by {
            rejected.push(Clause::OrderBy);
        }
        if let Some(m) = self.markers.iter().find(|m| rejected.contains(&m.clause)) {
            let at = self.tokens[m.first].start;
            return Err(match m.clause {
                Clause::SetOp => PageError::insertion_point(format!(
                    "top-level set operator at byte {at}; wrap the statement in a subquery"
                )),
                clause => PageError::insertion_point(format!(
                    "statement already has a top-level {} at byte {at}",
                    clause.label()
                )),
            });
        }
        Ok(())
    }

    /// Where appended `ORDER BY`/`LIMIT` text goes: before a locking clause,
    /// else at the end of the statement.
    pub fn tail_offset(&self) -> PageResult<usize> {
        match self.find(Clause::Locking) {
            Some(m) => self.end_before(m),
            None => Ok(self.body_end()),
        }
    }

    /// AND `predicate` into the statement's top-level `WHERE`, else `HAVING`,
    /// else add a `WHERE` before the first clause that must follow it.
    pub fn push_predicate(&self, predicate: &str, edits: &mut Edits) -> PageResult<()> {
        if let Some(m) = self.find(Clause::Where).or_else(|| self.find(Clause::Having)) {
            let (first, last) = self.condition_span(m)?;
            edits.insert(self.tokens[first].start, "(");
            edits.insert(self.tokens[last].end, format!(") AND {predicate}"));
            return Ok(());
        }

        let at = match self.markers.iter().find(|m| AFTER_WHERE.contains(&m.clause)) {
            Some(m) => self.end_before(*m)?,
            None => self.body_end(),
        };
        edits.insert(at, format!(" WHERE {predicate}"));
        Ok(())
    }

    /// Token range of the condition following a `WHERE`/`HAVING` marker.
    fn condition_span(&self, marker: Marker) -> PageResult<(usize, usize)> {
        let first = marker.last + 1;
        let stop = self
            .markers
            .iter()
            .find(|m| m.first > marker.last)
            .map_or(self.tokens.len(), |m| m.first);
        if first >= stop {
            return Err(PageError::insertion_point(format!(
                "empty {} condition",
                marker.clause.label()
            )));
        }
        Ok((first, stop - 1))
    }

    fn end_before(&self, marker: Marker) -> PageResult<usize> {
        match marker.first.checked_sub(1) {
            Some(prev) => Ok(self.tokens[prev].end),
            None => Err(PageError::insertion_point(format!(
                "statement starts with {}",
                marker.clause.label()
            ))),
        }
    }
}

fn find_markers(sql: &str, tokens: &[Token]) -> Vec<Marker> {
    let mut markers = Vec::new();
    let next_word = |i: usize| {
        tokens
            .get(i + 1)
            .filter(|t| t.kind == TokenKind::Word)
            .map(|t| t.text(sql))
    };
    let next_is = |i: usize, words: &[&str]| {
        next_word(i).is_some_and(|w| words.iter().any(|k| w.eq_ignore_ascii_case(k)))
    };

    for (i, token) in tokens.iter().enumerate() {
        if !token.is_top_level() || token.kind != TokenKind::Word {
            continue;
        }
        let word = token.text(sql).to_ascii_uppercase();
        let (clause, last) = match word.as_str() {
            "WHERE" => (Clause::Where, i),
            "HAVING" => (Clause::Having, i),
            "WINDOW" => (Clause::Window, i),
            "LIMIT" => (Clause::Limit, i),
            "OFFSET" => (Clause::Offset, i),
            "FETCH" => (Clause::Fetch, i),
            "GROUP" if next_is(i, &["BY"]) => (Clause::GroupBy, i + 1),
            "ORDER" if next_is(i, &["BY"]) => (Clause::OrderBy, i + 1),
            "FOR" if next_is(i, &["UPDATE", "SHARE", "NO", "KEY"]) => (Clause::Locking, i),
            "LOCK" if next_is(i, &["IN"]) => (Clause::Locking, i),
            "UNION" | "INTERSECT" | "EXCEPT" | "MINUS" => (Clause::SetOp, i),
            _ => continue,
        };
        markers.push(Marker {
            clause,
            first: i,
            last,
        });
    }
    markers
}

#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Non-overlapping text edits against the original statement offsets.
#[derive(Debug, Default)]
pub(crate) struct Edits {
    items: Vec<Edit>,
}

impl Edits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.replace(at, at, text);
    }

    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        self.items.push(Edit {
            start,
            end,
            text: text.into(),
        });
    }

    /// Apply to `sql[..until]`. Inserts at the same offset keep push order.
    pub fn apply(mut self, sql: &str, until: usize) -> String {
        self.items.sort_by_key(|e| (e.start, e.end));
        let extra: usize = self.items.iter().map(|e| e.text.len()).sum();
        let mut out = String::with_capacity(until + extra);
        let mut cursor = 0;
        for edit in &self.items {
            out.push_str(&sql[cursor..edit.start]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&sql[cursor..until]);
        out
    }
}
