//! Row cursors and result-shape helpers.
//!
//! [`RowCursor`] is the capability a querier hands back: column names, sequential advance and
//! raw access to the fields of the current row. [`Rows`] drives a cursor with the scanners a
//! query bound for this execution.
//!
//! A `Rows` must be drained or closed. Every helper that consumes it (`all`, `first`, `one`)
//! closes it on every exit path; dropping it unclosed closes it implicitly.


use crate::error::{BoxError, StmtError, StmtResult};
use crate::scan::{Column, Columns};
use std::future::Future;
use tokio_postgres::types::{FromSql, Type};

/// A raw value of the current row: its Postgres type plus the binary value, or `None` for NULL.
#[derive(Debug, Clone)]
pub struct RawField<'a> {
    pub ty: Type,
    pub raw: Option<&'a [u8]>,
}

impl RawField<'_> {
    pub fn is_null(&self) -> bool {
        self.raw.is_none()
    }
}

impl<'a> FromSql<'a> for RawField<'a> {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(RawField {
            ty: ty.clone(),
            raw: Some(raw),
        })
    }

    fn from_sql_null(ty: &Type) -> Result<Self, BoxError> {
        Ok(RawField {
            ty: ty.clone(),
            raw: None,
        })
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// A sequential, single-consumer handle over one live result set.
pub trait RowCursor: Send {
    /// Column names reported by the result, in result order.
    fn columns(&self) -> &[String];

    /// Move to the next row. `Ok(false)` means end of data.
    fn advance(&mut self) -> impl Future<Output = StmtResult<bool>> + Send;

    /// Raw field `index` of the current row.
    fn field(&self, index: usize) -> StmtResult<RawField<'_>>;

    /// Release the underlying result. Must be idempotent.
    fn close(&mut self);
}

/// Typed iteration over a cursor.
#[must_use = "rows must be drained or closed"]
pub struct Rows<T, C: RowCursor> {
    cursor: C,
    columns: Vec<Option<Box<dyn Column<T>>>>,
    closed: bool,
}

impl<T, C: RowCursor> Rows<T, C> {
    /// Bind `columns` against the names the cursor reports.
    ///
    /// The cursor is closed if binding fails.
    pub fn new(mut cursor: C, columns: &Columns<T>) -> StmtResult<Self> {
        match columns.bind(cursor.columns()) {
            Ok(columns) => Ok(Self {
                cursor,
                columns,
                closed: false,
            }),
            Err(err) => {
                cursor.close();
                Err(err)
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        self.cursor.columns()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Advance to the next row. Reaching the end, or failing, closes the cursor.
    pub async fn next(&mut self) -> StmtResult<bool> {
        if self.closed {
            return Ok(false);
        }

        match self.cursor.advance().await {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.close();
                Ok(false)
            }
            Err(err) => {
                self.close();
                Err(err)
            }
        }
    }

    /// Decode the current row and apply it onto `target`.
    ///
    /// Every bound column is staged before any is applied, so a decode failure leaves
    /// `target` untouched.
    pub fn scan(&mut self, target: &mut T) -> StmtResult<()> {
        if self.closed {
            return Err(StmtError::Other("rows are closed".to_string()));
        }

        let names = self.cursor.columns();
        for (index, slot) in self.columns.iter_mut().enumerate() {
            let Some(column) = slot else { continue };
            let field = self.cursor.field(index)?;
            column
                .stage(field)
                .map_err(|e| StmtError::decode(column_name(names, index), e.to_string()))?;
        }

        for (index, slot) in self.columns.iter_mut().enumerate() {
            let Some(column) = slot else { continue };
            column
                .apply(target)
                .map_err(|e| StmtError::decode(column_name(names, index), e.to_string()))?;
        }
        Ok(())
    }

    /// Decode the current row into a fresh `T`.
    pub fn value(&mut self) -> StmtResult<T>
    where
        T: Default,
    {
        let mut target = T::default();
        self.scan(&mut target)?;
        Ok(target)
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.cursor.close();
        }
    }

    /// Every remaining row, in order. An empty result is an empty `Vec`.
    pub async fn all(mut self) -> StmtResult<Vec<T>>
    where
        T: Default,
    {
        let result = self.drain().await;
        self.close();
        result
    }

    /// The first row; further rows are ignored.
    pub async fn first(mut self) -> StmtResult<T>
    where
        T: Default,
    {
        let result = self.take_first().await;
        self.close();
        result
    }

    /// Exactly one row: zero is [`StmtError::NoRows`], two or more [`StmtError::TooManyRows`].
    pub async fn one(mut self) -> StmtResult<T>
    where
        T: Default,
    {
        let result = match self.take_first().await {
            Ok(value) => match self.next().await {
                Ok(false) => Ok(value),
                Ok(true) => Err(StmtError::TooManyRows),
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        self.close();
        result
    }

    async fn drain(&mut self) -> StmtResult<Vec<T>>
    where
        T: Default,
    {
        let mut out = Vec::new();
        while self.next().await? {
            out.push(self.value()?);
        }
        Ok(out)
    }

    async fn take_first(&mut self) -> StmtResult<T>
    where
        T: Default,
    {
        if !self.next().await? {
            return Err(StmtError::NoRows);
        }
        self.value()
    }
}

impl<T, C: RowCursor> Drop for Rows<T, C> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::trace!(target: "pgstmt.sql", "rows dropped before close, closing cursor");
            self.close();
        }
    }
}

fn column_name(names: &[String], index: usize) -> String {
    names
        .get(index)
        .cloned()
        .unwrap_or_else(|| index.to_string())
}
