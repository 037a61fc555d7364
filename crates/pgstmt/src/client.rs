//! Database capabilities.
//!
//! [`Querier`] and [`Executor`] are the two narrow contracts a [`Query`](crate::Query) or
//! [`Exec`](crate::Exec) needs from a connection. They are implemented for `tokio-postgres`
//! clients and transactions and, with the `pool` feature, for pooled `deadpool-postgres`
//! clients, so a transaction can be passed anywhere a client is expected.
//!
//! Cancellation is the caller's: drop the returned future or wrap it in a timeout.

use crate::arg::Arg;
use crate::cursor::{RawField, RowCursor};
use crate::error::{StmtError, StmtResult};
use futures_util::StreamExt;
use std::future::Future;
use std::pin::Pin;
use tokio_postgres::{Row, RowStream};

/// Issues a query and hands back a cursor over its result.
pub trait Querier: Send + Sync {
    type Cursor: RowCursor;

    fn query(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = StmtResult<Self::Cursor>> + Send;
}

/// Issues a statement that yields no rows.
pub trait Executor: Send + Sync {
    /// Whatever the capability reports back; affected rows for Postgres.
    type Outcome: Send;

    fn execute(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = StmtResult<Self::Outcome>> + Send;
}

// ==================== Postgres cursor ====================

/// A streaming cursor over a `tokio-postgres` result.
pub struct PgCursor {
    columns: Vec<String>,
    stream: Option<Pin<Box<RowStream>>>,
    row: Option<Row>,
    rows_affected: Option<u64>,
}

impl PgCursor {
    fn new(columns: Vec<String>, stream: RowStream) -> Self {
        Self {
            columns,
            stream: Some(Box::pin(stream)),
            row: None,
            rows_affected: None,
        }
    }

    /// Rows reported by the command tag, once the stream is exhausted.
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }
}

impl RowCursor for PgCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn advance(&mut self) -> StmtResult<bool> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };

        match stream.next().await {
            Some(Ok(row)) => {
                self.row = Some(row);
                Ok(true)
            }
            Some(Err(err)) => {
                self.close();
                Err(err.into())
            }
            None => {
                self.rows_affected = stream.rows_affected();
                self.close();
                Ok(false)
            }
        }
    }

    fn field(&self, index: usize) -> StmtResult<RawField<'_>> {
        let row = self
            .row
            .as_ref()
            .ok_or_else(|| StmtError::Other("cursor is not positioned on a row".to_string()))?;
        Ok(row.try_get::<_, RawField<'_>>(index)?)
    }

    fn close(&mut self) {
        // Dropping the stream discards whatever the server still sends for this portal.
        self.stream = None;
        self.row = None;
    }
}

async fn pg_query<C>(client: &C, sql: &str, args: &[Arg]) -> StmtResult<PgCursor>
where
    C: tokio_postgres::GenericClient + Sync,
{
    // Column names are only known once the statement is described.
    let statement = client.prepare(sql).await?;
    let columns = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let stream = client.query_raw(&statement, Arg::refs(args)).await?;
    Ok(PgCursor::new(columns, stream))
}

async fn pg_execute<C>(client: &C, sql: &str, args: &[Arg]) -> StmtResult<u64>
where
    C: tokio_postgres::GenericClient + Sync,
{
    let refs = Arg::refs(args);
    Ok(tokio_postgres::GenericClient::execute(client, sql, &refs).await?)
}

impl Querier for tokio_postgres::Client {
    type Cursor = PgCursor;

    async fn query(&self, sql: &str, args: &[Arg]) -> StmtResult<PgCursor> {
        pg_query(self, sql, args).await
    }
}

impl Executor for tokio_postgres::Client {
    type Outcome = u64;

    async fn execute(&self, sql: &str, args: &[Arg]) -> StmtResult<u64> {
        pg_execute(self, sql, args).await
    }
}

impl Querier for tokio_postgres::Transaction<'_> {
    type Cursor = PgCursor;

    async fn query(&self, sql: &str, args: &[Arg]) -> StmtResult<PgCursor> {
        pg_query(self, sql, args).await
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    type Outcome = u64;

    async fn execute(&self, sql: &str, args: &[Arg]) -> StmtResult<u64> {
        pg_execute(self, sql, args).await
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Querier for deadpool_postgres::Client {
    type Cursor = PgCursor;

    async fn query(&self, sql: &str, args: &[Arg]) -> StmtResult<PgCursor> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        Querier::query(&**self, sql, args).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    type Outcome = u64;

    async fn execute(&self, sql: &str, args: &[Arg]) -> StmtResult<u64> {
        Executor::execute(&**self, sql, args).await
    }
}

#[cfg(feature = "pool")]
impl Querier for deadpool_postgres::ClientWrapper {
    type Cursor = PgCursor;

    async fn query(&self, sql: &str, args: &[Arg]) -> StmtResult<PgCursor> {
        Querier::query(&**self, sql, args).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::ClientWrapper {
    type Outcome = u64;

    async fn execute(&self, sql: &str, args: &[Arg]) -> StmtResult<u64> {
        Executor::execute(&**self, sql, args).await
    }
}

#[cfg(feature = "pool")]
impl Querier for deadpool_postgres::Transaction<'_> {
    type Cursor = PgCursor;

    async fn query(&self, sql: &str, args: &[Arg]) -> StmtResult<PgCursor> {
        Querier::query(&**self, sql, args).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Transaction<'_> {
    type Outcome = u64;

    async fn execute(&self, sql: &str, args: &[Arg]) -> StmtResult<u64> {
        Executor::execute(&**self, sql, args).await
    }
}

// ===== references =====

impl<C: Querier + ?Sized> Querier for &C {
    type Cursor = C::Cursor;

    fn query(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = StmtResult<Self::Cursor>> + Send {
        (**self).query(sql, args)
    }
}

impl<C: Executor + ?Sized> Executor for &C {
    type Outcome = C::Outcome;

    fn execute(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = StmtResult<Self::Outcome>> + Send {
        (**self).execute(sql, args)
    }
}
