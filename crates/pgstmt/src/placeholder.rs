//! Placeholder dialects.
//!
//! Statements always resolve to SQL that uses the generic [`MARKER`] (`?`). A doubled
//! marker (`??`) is the escape for a literal question mark. A [`Placeholder`] rewrites the
//! resolved text once, right before it is sent to the database:
//!
//! - [`StaticPlaceholder`] replaces every marker with a fixed string.
//! - [`PositionalPlaceholder`] replaces markers with a prefix plus a 1-based index.
//!
//! ```ignore
//! use pgstmt::{DOLLAR, Placeholder};
//!
//! let sql = DOLLAR.replace_placeholders("SELECT * FROM t WHERE a = ? AND b ?? 'k'")?;
//! assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b ? 'k'");
//! ```

use crate::error::StmtResult;
use std::borrow::Cow;
use std::fmt::Write;

/// The reserved placeholder character.
pub const MARKER: char = '?';

/// `?` markers left untouched.
pub const QUESTION: StaticPlaceholder = StaticPlaceholder::new("?");

/// Postgres style: `$1, $2, ...`
pub const DOLLAR: PositionalPlaceholder = PositionalPlaceholder::new("$");

/// Oracle style: `:1, :2, ...`
pub const COLON: PositionalPlaceholder = PositionalPlaceholder::new(":");

/// SQL Server style: `@p1, @p2, ...`
pub const AT_P: PositionalPlaceholder = PositionalPlaceholder::new("@p");

/// Rewrites generic-marker SQL into a dialect-specific form.
pub trait Placeholder: Send + Sync {
    fn replace_placeholders(&self, sql: &str) -> StmtResult<String>;
}

impl<F> Placeholder for F
where
    F: Fn(&str) -> StmtResult<String> + Send + Sync,
{
    fn replace_placeholders(&self, sql: &str) -> StmtResult<String> {
        self(sql)
    }
}

/// Replaces every unescaped marker with the same string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPlaceholder(Cow<'static, str>);

impl StaticPlaceholder {
    pub const fn new(marker: &'static str) -> Self {
        Self(Cow::Borrowed(marker))
    }

    /// Build a dialect from a runtime string.
    pub fn owned(marker: impl Into<String>) -> Self {
        Self(Cow::Owned(marker.into()))
    }
}

impl Placeholder for StaticPlaceholder {
    fn replace_placeholders(&self, sql: &str) -> StmtResult<String> {
        // Identity: the driver already speaks `?`, escapes included.
        if self.0 == "?" {
            return Ok(sql.to_string());
        }

        Ok(rewrite(sql, |out, _| out.push_str(&self.0)))
    }
}

/// Replaces unescaped markers with a prefix and an increasing 1-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalPlaceholder(Cow<'static, str>);

impl PositionalPlaceholder {
    pub const fn new(prefix: &'static str) -> Self {
        Self(Cow::Borrowed(prefix))
    }

    /// Build a dialect from a runtime prefix.
    pub fn owned(prefix: impl Into<String>) -> Self {
        Self(Cow::Owned(prefix.into()))
    }
}

impl Placeholder for PositionalPlaceholder {
    fn replace_placeholders(&self, sql: &str) -> StmtResult<String> {
        Ok(rewrite(sql, |out, index| {
            out.push_str(&self.0);
            // Writing into a String never fails.
            let _ = write!(out, "{index}");
        }))
    }
}

/// Scan `sql` left to right, collapsing `??` into `?` and handing each remaining
/// marker (with its 1-based index) to `emit`.
fn rewrite(sql: &str, mut emit: impl FnMut(&mut String, usize)) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut rest = sql;
    let mut index = 0;

    while let Some(pos) = rest.find(MARKER) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if after.starts_with(MARKER) {
            out.push(MARKER);
            rest = &after[1..];
            continue;
        }

        index += 1;
        emit(&mut out, index);
        rest = after;
    }

    out.push_str(rest);
    out
}
