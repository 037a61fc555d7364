//! In-memory querier/executor for unit tests.
//!
//! Cells are encoded with the real `tokio-postgres` binary encoders, so scanners decode them
//! exactly as they would a server response.

use crate::arg::Arg;
use crate::client::{Executor, Querier};
use crate::cursor::{RawField, RowCursor};
use crate::error::{StmtError, StmtResult};
use bytes::BytesMut;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_postgres::types::{IsNull, ToSql, Type};

#[derive(Debug, Clone)]
pub(crate) struct Cell {
    ty: Type,
    raw: Option<BytesMut>,
}

impl Cell {
    pub(crate) fn field(&self) -> RawField<'_> {
        RawField {
            ty: self.ty.clone(),
            raw: self.raw.as_deref(),
        }
    }
}

/// Encode `value` as Postgres type `ty`.
pub(crate) fn cell<V: ToSql>(ty: Type, value: V) -> Cell {
    let mut buf = BytesMut::new();
    match value.to_sql_checked(&ty, &mut buf).expect("encode cell") {
        IsNull::Yes => Cell { ty, raw: None },
        IsNull::No => Cell { ty, raw: Some(buf) },
    }
}

pub(crate) fn null(ty: Type) -> Cell {
    Cell { ty, raw: None }
}

#[derive(Default)]
pub(crate) struct Calls {
    opened: AtomicUsize,
    closed: AtomicUsize,
    issued: Mutex<Vec<(String, usize)>>,
}

/// A canned result set plus counters for what the code under test did with it.
#[derive(Default)]
pub(crate) struct MockDb {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    fail_query: Option<String>,
    fail_at_row: Option<usize>,
    affected: u64,
    calls: Arc<Calls>,
}

impl MockDb {
    pub(crate) fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn row(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(cells);
        self
    }

    pub(crate) fn fail_query(mut self, message: &str) -> Self {
        self.fail_query = Some(message.to_string());
        self
    }

    /// Make `advance` fail after `n` rows were produced.
    pub(crate) fn fail_at_row(mut self, n: usize) -> Self {
        self.fail_at_row = Some(n);
        self
    }

    pub(crate) fn affected(mut self, n: u64) -> Self {
        self.affected = n;
        self
    }

    pub(crate) fn opened(&self) -> usize {
        self.calls.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.calls.closed.load(Ordering::SeqCst)
    }

    /// `(sql, argument count)` of every call issued so far.
    pub(crate) fn issued(&self) -> Vec<(String, usize)> {
        self.calls.issued.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, args: &[Arg]) -> StmtResult<()> {
        self.calls
            .issued
            .lock()
            .unwrap()
            .push((sql.to_string(), args.len()));
        match &self.fail_query {
            Some(message) => Err(StmtError::driver(message.clone())),
            None => Ok(()),
        }
    }

    /// A cursor over the canned rows, outside of any query.
    pub(crate) fn cursor(&self) -> MockCursor {
        self.calls.opened.fetch_add(1, Ordering::SeqCst);
        MockCursor {
            columns: self.columns.clone(),
            rows: self.rows.iter().cloned().collect(),
            current: None,
            produced: 0,
            fail_at_row: self.fail_at_row,
            closed: false,
            calls: Arc::clone(&self.calls),
        }
    }
}

impl Querier for MockDb {
    type Cursor = MockCursor;

    async fn query(&self, sql: &str, args: &[Arg]) -> StmtResult<MockCursor> {
        self.record(sql, args)?;
        Ok(self.cursor())
    }
}

impl Executor for MockDb {
    type Outcome = u64;

    async fn execute(&self, sql: &str, args: &[Arg]) -> StmtResult<u64> {
        self.record(sql, args)?;
        Ok(self.affected)
    }
}

pub(crate) struct MockCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Cell>>,
    current: Option<Vec<Cell>>,
    produced: usize,
    fail_at_row: Option<usize>,
    closed: bool,
    calls: Arc<Calls>,
}

impl RowCursor for MockCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn advance(&mut self) -> StmtResult<bool> {
        if self.closed {
            return Ok(false);
        }
        if self.fail_at_row == Some(self.produced) {
            return Err(StmtError::driver("connection reset while reading rows"));
        }

        self.current = self.rows.pop_front();
        if self.current.is_none() {
            return Ok(false);
        }
        self.produced += 1;
        Ok(true)
    }

    fn field(&self, index: usize) -> StmtResult<RawField<'_>> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| StmtError::Other("no current row".to_string()))?;
        row.get(index)
            .map(Cell::field)
            .ok_or_else(|| StmtError::Other(format!("no field {index}")))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.current = None;
            self.calls.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
