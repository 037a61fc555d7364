//! Query and exec orchestration.
//!
//! A [`Query`] bundles a statement tree, a placeholder dialect and a column table. It is
//! immutable once built and can be shared across tasks; every call resolves the statement
//! against its own parameter.
//!
//! ```ignore
//! use pgstmt::prelude::*;
//!
//! let by_status = Query::<User, String>::new(stmt::<String>("SELECT id, name FROM users WHERE status = ?"))
//!     .column("id", scan(|u: &mut User, v: i64| u.id = v))
//!     .column("name", scan(|u: &mut User, v: String| u.name = v))
//!     .tag("users.by_status");
//!
//! let active = by_status.all(&client, &"active".to_string()).await?;
//! ```


use crate::client::{Executor, Querier};
use crate::cursor::Rows;
use crate::error::StmtResult;
use crate::placeholder::{DOLLAR, Placeholder};
use crate::scan::{Columns, Scanner};
use crate::statement::{BoxStatement, Fragment, Statement, StatementExt};
use std::borrow::Cow;
use std::sync::Arc;
use tokio_postgres::types::FromSql;

/// Longest SQL text written to a log event, in bytes.
const MAX_LOGGED_SQL: usize = 200;

fn truncate_sql(sql: &str, max_bytes: usize) -> Cow<'_, str> {
    if sql.len() <= max_bytes {
        return Cow::Borrowed(sql);
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}...", &sql[..end]))
}

/// Resolve `statement` and rewrite its markers.
fn resolve<P: ?Sized>(
    statement: &dyn Statement<P>,
    placeholder: Option<&dyn Placeholder>,
    tag: Option<&str>,
    param: &P,
) -> StmtResult<Fragment> {
    let result = statement.to_sql(param).and_then(|mut fragment| {
        if let Some(placeholder) = placeholder {
            fragment.sql = placeholder.replace_placeholders(&fragment.sql)?;
        }
        Ok(fragment)
    });

    if let Err(err) = &result {
        tracing::debug!(
            target: "pgstmt.sql",
            tag = tag.unwrap_or("-"),
            error = %err,
            "statement resolution failed"
        );
    }
    result
}

fn log_issue(kind: &'static str, tag: Option<&str>, fragment: &Fragment) {
    tracing::debug!(
        target: "pgstmt.sql",
        kind,
        tag = tag.unwrap_or("-"),
        param_count = fragment.args.len(),
        sql = %truncate_sql(&fragment.sql, MAX_LOGGED_SQL),
    );
}

// ==================== Query ====================

/// A reusable row-returning statement decoding into `T`.
pub struct Query<T, P: ?Sized> {
    statement: BoxStatement<P>,
    placeholder: Option<Arc<dyn Placeholder>>,
    columns: Columns<T>,
    tag: Option<String>,
}

impl<T: 'static, P: ?Sized + 'static> Query<T, P> {
    /// A query with no columns declared yet, rewriting markers to `$n`.
    ///
    /// Declare at least one column with [`Query::column`] or [`Query::columns`] before running
    /// it. A query with no declared columns has no fallback for decoding rows: `rows`, `all`,
    /// `first` and `one` fail with [`StmtError::Other`] once the result columns arrive, after
    /// the statement has been sent. Targets that decode straight from one column use
    /// [`Query::scalar`] instead.
    ///
    /// [`StmtError::Other`]: crate::error::StmtError::Other
    pub fn new(statement: impl Statement<P> + 'static) -> Self {
        Self::with_columns(statement, Columns::new())
    }

    /// A query whose single result column decodes straight into `T`.
    ///
    /// ```ignore
    /// let count = Query::<i64, ()>::scalar(template("SELECT count(*) FROM users"));
    /// ```
    pub fn scalar(statement: impl Statement<P> + 'static) -> Self
    where
        T: for<'a> FromSql<'a> + Send,
    {
        Self::with_columns(statement, Columns::whole())
    }

    fn with_columns(statement: impl Statement<P> + 'static, columns: Columns<T>) -> Self {
        Self {
            statement: statement.boxed(),
            placeholder: Some(Arc::new(DOLLAR)),
            columns,
            tag: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Placeholder + 'static) -> Self {
        self.placeholder = Some(Arc::new(placeholder));
        self
    }

    /// Send the generic `?` markers as they are.
    pub fn without_placeholder(mut self) -> Self {
        self.placeholder = None;
        self
    }

    pub fn column(mut self, name: impl Into<String>, scanner: impl Scanner<T> + 'static) -> Self {
        self.columns = self.columns.column(name, scanner);
        self
    }

    /// Replace the whole column table.
    pub fn columns(mut self, columns: Columns<T>) -> Self {
        self.columns = columns;
        self
    }

    /// Label carried by log events for this query.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl<T, P: ?Sized> Query<T, P> {
    /// Resolve and rewrite without executing.
    pub fn build(&self, param: &P) -> StmtResult<Fragment> {
        resolve(
            &*self.statement,
            self.placeholder.as_deref(),
            self.tag.as_deref(),
            param,
        )
    }

    /// Issue the query and return a cursor over its rows.
    pub async fn rows<Q: Querier>(&self, querier: &Q, param: &P) -> StmtResult<Rows<T, Q::Cursor>> {
        let fragment = self.build(param)?;
        log_issue("query", self.tag.as_deref(), &fragment);
        let cursor = querier.query(&fragment.sql, &fragment.args).await?;
        Rows::new(cursor, &self.columns)
    }

    /// Every row, in order.
    pub async fn all<Q: Querier>(&self, querier: &Q, param: &P) -> StmtResult<Vec<T>>
    where
        T: Default,
    {
        self.rows(querier, param).await?.all().await
    }

    /// The first row; [`StmtError::NoRows`](crate::StmtError::NoRows) when there is none.
    pub async fn first<Q: Querier>(&self, querier: &Q, param: &P) -> StmtResult<T>
    where
        T: Default,
    {
        self.rows(querier, param).await?.first().await
    }

    /// Exactly one row.
    pub async fn one<Q: Querier>(&self, querier: &Q, param: &P) -> StmtResult<T>
    where
        T: Default,
    {
        self.rows(querier, param).await?.one().await
    }
}

// ==================== Exec ====================

/// A reusable statement that returns no rows.
pub struct Exec<P: ?Sized> {
    statement: BoxStatement<P>,
    placeholder: Option<Arc<dyn Placeholder>>,
    tag: Option<String>,
}

impl<P: ?Sized + 'static> Exec<P> {
    pub fn new(statement: impl Statement<P> + 'static) -> Self {
        Self {
            statement: statement.boxed(),
            placeholder: Some(Arc::new(DOLLAR)),
            tag: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Placeholder + 'static) -> Self {
        self.placeholder = Some(Arc::new(placeholder));
        self
    }

    pub fn without_placeholder(mut self) -> Self {
        self.placeholder = None;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl<P: ?Sized> Exec<P> {
    pub fn build(&self, param: &P) -> StmtResult<Fragment> {
        resolve(
            &*self.statement,
            self.placeholder.as_deref(),
            self.tag.as_deref(),
            param,
        )
    }

    /// Issue the statement and return the executor's outcome unchanged.
    pub async fn result<E: Executor>(&self, executor: &E, param: &P) -> StmtResult<E::Outcome> {
        let fragment = self.build(param)?;
        log_issue("exec", self.tag.as_deref(), &fragment);
        executor.execute(&fragment.sql, &fragment.args).await
    }
}
