//! Placeholder scanning and rewriting.
//!
//! Two passes operate on finished SQL text:
//!
//! - [`expand_list_args`]: every `?` bound to a list argument becomes one
//!   placeholder per element, so `in (?)` with `[1, 2, 3]` runs as
//!   `in (?, ?, ?)`.
//! - [`number_placeholders`]: `?` → `$1, $2, ...` for Postgres.
//!
//! Both ignore `?` inside quoted strings, quoted identifiers and comments,
//! following the quoting rules of the statement's [`Dialect`].

use crate::builder::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::borrow::Cow;

#[derive(Clone)]
enum State {
    Normal,
    /// `escapes`: a backslash escapes the next byte.
    SingleQuoted { escapes: bool },
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `E'...'` string prefix, not the tail of a longer identifier.
fn is_escape_prefix(bytes: &[u8], quote: usize) -> bool {
    quote >= 1
        && matches!(bytes[quote - 1], b'E' | b'e')
        && (quote == 1 || !(is_ident_byte(bytes[quote - 2]) || bytes[quote - 2] == b'$'))
}

/// Opening `$tag$` at `start`: returns the tag and the index of the closing `$`.
fn dollar_quote_start(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    if start > 0 && (is_ident_byte(bytes[start - 1]) || bytes[start - 1] == b'$') {
        return None;
    }
    if bytes.get(start + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && is_ident_byte(bytes[idx]) {
        idx += 1;
    }
    if bytes.get(idx) != Some(&b'$') {
        return None;
    }
    let tag = std::str::from_utf8(&bytes[start + 1..idx]).ok()?;
    Some((tag.to_string(), idx))
}

fn closes_dollar_quote(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    bytes.get(idx + 1..end) == Some(tag.as_bytes()) && bytes.get(end) == Some(&b'$')
}

/// Byte offsets of every bindable `?` in `sql`.
///
/// MySQL: backslash escapes in strings, backtick identifiers, flat block
/// comments. Postgres: backslash escapes only in `E'...'` strings, nested
/// block comments, `$tag$...$tag$` bodies.
pub fn placeholder_positions(sql: &str, dialect: Dialect) -> Vec<usize> {
    let pg = dialect == Dialect::Postgres;
    let bytes = sql.as_bytes();
    let mut positions = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    state = State::SingleQuoted {
                        escapes: !pg || is_escape_prefix(bytes, idx),
                    }
                }
                b'"' => state = State::DoubleQuoted,
                b'`' if !pg => state = State::Backticked,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'#' if !pg => state = State::LineComment,
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' if pg => {
                    if let Some((tag, close)) = dollar_quote_start(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    }
                }
                b'?' => positions.push(idx),
                _ => {}
            },
            State::SingleQuoted { escapes } => match b {
                b'\\' if escapes => idx += 1,
                b'\'' if bytes.get(idx + 1) == Some(&b'\'') => idx += 1,
                b'\'' => state = State::Normal,
                _ => {}
            },
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Backticked => {
                if b == b'`' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if pg && b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && closes_dollar_quote(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    positions
}

/// Expand list arguments into repeated placeholders.
///
/// Returns the input untouched when no argument is a list. Otherwise the
/// number of placeholders must match the number of arguments. An empty list
/// becomes the literal `NULL`, which matches no row in `in (...)`.
pub fn expand_list_args<'a>(
    sql: &'a str,
    args: Vec<Value>,
    dialect: Dialect,
) -> OrmResult<(Cow<'a, str>, Vec<Value>)> {
    if !args.iter().any(Value::is_list) {
        return Ok((Cow::Borrowed(sql), args));
    }

    let positions = placeholder_positions(sql, dialect);
    if positions.len() != args.len() {
        return Err(OrmError::validation(format!(
            "statement has {} placeholders but {} arguments",
            positions.len(),
            args.len()
        )));
    }

    let mut out = String::with_capacity(sql.len() + args.len() * 3);
    let mut flat = Vec::with_capacity(args.len());
    let mut last = 0;

    for (pos, arg) in positions.into_iter().zip(args) {
        out.push_str(&sql[last..pos]);
        last = pos + 1;
        match arg {
            Value::List(items) if items.is_empty() => out.push_str("NULL"),
            Value::List(items) => {
                out.push_str(&vec!["?"; items.len()].join(", "));
                flat.extend(items);
            }
            other => {
                out.push('?');
                flat.push(other);
            }
        }
    }
    out.push_str(&sql[last..]);

    Ok((Cow::Owned(out), flat))
}

/// Rewrite `?` placeholders to `$1..$n`.
pub fn number_placeholders(sql: &str) -> Cow<'_, str> {
    let positions = placeholder_positions(sql, Dialect::Postgres);
    if positions.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + positions.len() * 2);
    let mut last = 0;
    for (n, pos) in positions.into_iter().enumerate() {
        out.push_str(&sql[last..pos]);
        out.push('$');
        out.push_str(&(n + 1).to_string());
        last = pos + 1;
    }
    out.push_str(&sql[last..]);
    Cow::Owned(out)
}
