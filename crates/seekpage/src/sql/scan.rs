//! Lexical scan of a SQL statement.
//!
//! The scanner only classifies what splicing needs: words, `:name`
//! placeholders, parentheses and `;`. String literals, quoted identifiers,
//! comments and `::` casts are consumed whole so nothing inside them is ever
//! mistaken for a keyword or a placeholder.

use crate::dialect::Dialect;
use crate::error::{PageError, PageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word,
    Placeholder,
    OpenParen,
    CloseParen,
    Semicolon,
    Other,
}

/// A classified byte span of the statement.
///
/// `depth` is the parenthesis depth the token sits at; a parenthesis itself
/// reports the outer depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub depth: usize,
}

impl Token {
    pub fn text<'a>(&self, sql: &'a str) -> &'a str {
        &sql[self.start..self.end]
    }

    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }

    /// Placeholder name without the leading `:`.
    pub fn placeholder_name<'a>(&self, sql: &'a str) -> Option<&'a str> {
        match self.kind {
            TokenKind::Placeholder => Some(&sql[self.start + 1..self.end]),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rules {
    backslash_escapes: bool,
    hash_comments: bool,
    nested_comments: bool,
    dollar_quotes: bool,
}

impl Rules {
    fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::MySql => Self {
                backslash_escapes: true,
                hash_comments: true,
                nested_comments: false,
                dollar_quotes: false,
            },
            Dialect::Sqlite => Self {
                backslash_escapes: false,
                hash_comments: false,
                nested_comments: false,
                dollar_quotes: false,
            },
            Dialect::Postgres => Self {
                backslash_escapes: false,
                hash_comments: false,
                nested_comments: true,
                dollar_quotes: true,
            },
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic() || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit() || b == b'$'
}

fn unterminated(what: &str, at: usize) -> PageError {
    PageError::insertion_point(format!("unterminated {what} starting at byte {at}"))
}

/// Index just past the closing `quote`, honouring doubled quotes.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8, backslash_escapes: bool) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if backslash_escapes && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

fn skip_block_comment(bytes: &[u8], open: usize, nested: bool) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') if depth == 0 || nested => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

fn skip_line(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| from + p + 1)
}

/// End of a `$tag$` opener at `open`, if one starts there.
fn dollar_tag_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    if bytes.get(i).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    while i < bytes.len() && is_ident_char(bytes[i]) && bytes[i] != b'$' {
        i += 1;
    }
    (bytes.get(i) == Some(&b'$')).then_some(i + 1)
}

/// Tokenize `sql` under the quoting rules of `dialect`.
///
/// Fails with [`PageError::InsertionPoint`] on unbalanced parentheses or an
/// unterminated literal, quoted identifier or block comment.
pub(crate) fn tokenize(sql: &str, dialect: Dialect) -> PageResult<Vec<Token>> {
    let rules = Rules::for_dialect(dialect);
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let start = i;
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        let kind = match b {
            b if b.is_ascii_whitespace() => {
                i += 1;
                continue;
            }
            b'-' if next == Some(b'-') => {
                i = skip_line(bytes, i);
                continue;
            }
            b'#' if rules.hash_comments => {
                i = skip_line(bytes, i);
                continue;
            }
            b'/' if next == Some(b'*') => {
                i = skip_block_comment(bytes, i, rules.nested_comments)
                    .ok_or_else(|| unterminated("block comment", start))?;
                continue;
            }
            b'\'' => {
                i = skip_quoted(bytes, i, b'\'', rules.backslash_escapes)
                    .ok_or_else(|| unterminated("string literal", start))?;
                TokenKind::Other
            }
            // A string literal on MySQL, an identifier elsewhere.
            b'"' => {
                i = skip_quoted(bytes, i, b'"', rules.backslash_escapes)
                    .ok_or_else(|| unterminated("double-quoted string", start))?;
                TokenKind::Other
            }
            b'`' => {
                i = skip_quoted(bytes, i, b'`', false)
                    .ok_or_else(|| unterminated("quoted identifier", start))?;
                TokenKind::Other
            }
            b'$' if rules.dollar_quotes => match dollar_tag_end(bytes, i) {
                Some(tag_end) => {
                    let tag = &sql[start..tag_end];
                    let close = sql[tag_end..]
                        .find(tag)
                        .ok_or_else(|| unterminated("dollar-quoted string", start))?;
                    i = tag_end + close + tag.len();
                    TokenKind::Other
                }
                None => {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    TokenKind::Other
                }
            },
            b'(' => {
                tokens.push(Token {
                    kind: TokenKind::OpenParen,
                    start,
                    end: i + 1,
                    depth,
                });
                depth += 1;
                i += 1;
                continue;
            }
            b')' => {
                if depth == 0 {
                    return Err(PageError::insertion_point(format!(
                        "unbalanced parentheses: unexpected ')' at byte {start}"
                    )));
                }
                depth -= 1;
                i += 1;
                TokenKind::CloseParen
            }
            b';' => {
                i += 1;
                TokenKind::Semicolon
            }
            b':' if next == Some(b':') => {
                i += 2;
                TokenKind::Other
            }
            b':' if next.is_some_and(is_ident_start) => {
                i += 1;
                while i < bytes.len() && is_ident_char(bytes[i]) && bytes[i] != b'$' {
                    i += 1;
                }
                TokenKind::Placeholder
            }
            b if is_ident_start(b) => {
                while i < bytes.len() && is_ident_char(bytes[i]) {
                    i += 1;
                }
                // E'...' escape strings always honour backslashes.
                if rules.dollar_quotes
                    && i - start == 1
                    && (b == b'E' || b == b'e')
                    && bytes.get(i) == Some(&b'\'')
                {
                    i = skip_quoted(bytes, i, b'\'', true)
                        .ok_or_else(|| unterminated("string literal", start))?;
                    TokenKind::Other
                } else {
                    TokenKind::Word
                }
            }
            b if b.is_ascii_digit() => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                    i += 1;
                }
                TokenKind::Other
            }
            _ => {
                i += 1;
                TokenKind::Other
            }
        };

        tokens.push(Token {
            kind,
            start,
            end: i,
            depth,
        });
    }

    if depth != 0 {
        return Err(PageError::insertion_point(format!(
            "unbalanced parentheses: {depth} unclosed '('"
        )));
    }
    Ok(tokens)
}
