//! Reflection-free column scanning.
//!
//! A query declares, per output column name, a [`Scanner`]: a factory invoked once per
//! execution that yields a fresh [`Column`]. A column owns a typed staging slot filled from
//! the raw cursor value on every row, and knows how to apply that staged value onto the
//! target for the row.
//!
//! ```ignore
//! use pgstmt::scan::{Columns, scan, timestamp};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     nickname: String,
//!     joined: chrono::NaiveDateTime,
//! }
//!
//! let columns = Columns::new()
//!     .column("id", scan(|u: &mut User, v: i64| u.id = v))
//!     .column("name", scan(|u: &mut User, v: String| u.name = v))
//!     .column("nickname", scan(|u: &mut User, v: String| u.nickname = v).nullable(String::new()))
//!     .column("joined", timestamp("%Y-%m-%d %H:%M:%S", scan(|u: &mut User, v| u.joined = v)));
//! ```

mod func;


pub use func::{ScanFn, scan, timestamp, try_scan};

use crate::cursor::RawField;
use crate::error::{BoxError, StmtError, StmtResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_postgres::types::FromSql;

/// Per-execution column state: a typed staging slot plus its apply step.
pub trait Column<T>: Send {
    /// Decode the raw value of the current row into the staging slot.
    fn stage(&mut self, field: RawField<'_>) -> Result<(), BoxError>;

    /// Move the staged value into `target`.
    fn apply(&mut self, target: &mut T) -> Result<(), BoxError>;
}

/// Column factory, invoked once per query execution.
pub trait Scanner<T>: Send + Sync {
    fn scan(&self) -> Box<dyn Column<T>>;
}

/// Shared, type-erased scanner.
pub type BoxScanner<T> = Arc<dyn Scanner<T>>;

/// Decode a raw field into `V` using the `tokio-postgres` wire decoders.
pub(crate) fn decode<V>(field: &RawField<'_>) -> Result<V, BoxError>
where
    V: for<'a> FromSql<'a>,
{
    if !V::accepts(&field.ty) {
        return Err(format!(
            "cannot convert Postgres type `{}` to Rust type `{}`",
            field.ty,
            std::any::type_name::<V>()
        )
        .into());
    }
    V::from_sql_nullable(&field.ty, field.raw)
}

/// The declared name → scanner table of a query.
///
/// Binding happens by name once the real column list of a result is known, so declaration
/// order never matters. Result columns without a scanner are skipped.
pub struct Columns<T> {
    by_name: HashMap<String, BoxScanner<T>>,
    whole: Option<BoxScanner<T>>,
}

impl<T> Default for Columns<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            whole: None,
        }
    }
}

impl<T: 'static> Columns<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a scanner for the column called `name`.
    pub fn column(mut self, name: impl Into<String>, scanner: impl Scanner<T> + 'static) -> Self {
        self.by_name.insert(name.into(), Arc::new(scanner));
        self
    }

    /// Whole-value mode: the first result column decodes straight into `T`.
    pub fn whole() -> Self
    where
        T: for<'a> FromSql<'a> + Send + 'static,
    {
        Self {
            by_name: HashMap::new(),
            whole: Some(Arc::new(scan(|t: &mut T, v: T| *t = v))),
        }
    }
}

impl<T> Columns<T> {
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Resolve the table against the column names a result actually reported.
    ///
    /// Returns one slot per result column; `None` marks a column that is discarded.
    pub(crate) fn bind(&self, names: &[String]) -> StmtResult<Vec<Option<Box<dyn Column<T>>>>> {
        if self.by_name.is_empty() {
            let Some(whole) = &self.whole else {
                return Err(StmtError::Other(
                    "query declares no columns and has no whole-value scanner".to_string(),
                ));
            };
            if names.is_empty() {
                return Err(StmtError::decode("0", "result set has no columns"));
            }
            let mut bound: Vec<Option<Box<dyn Column<T>>>> = Vec::with_capacity(names.len());
            bound.push(Some(whole.scan()));
            bound.resize_with(names.len(), || None);
            return Ok(bound);
        }

        Ok(names
            .iter()
            .map(|name| self.by_name.get(name).map(|scanner| scanner.scan()))
            .collect())
    }
}
