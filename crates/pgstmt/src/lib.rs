//! # pgstmt
//!
//! Composable parameterized SQL statements and reflection-free row scanning for PostgreSQL.
//!
//! ## Features
//!
//! - **Statement trees**: build SQL from small nodes (templates, prefixes, joins, lists,
//!   parameter maps, bounded recursion) once, then resolve them against any parameter value
//! - **Clean optional clauses**: empty children vanish together with their arguments
//! - **Placeholder dialects**: statements use `?`; the dialect (`$1`, `:1`, `@p1`, ...) is
//!   applied once at execution time
//! - **Column scanners**: one typed closure per column name, bound by name to whatever the
//!   result reports
//! - **Transaction-friendly**: clients, transactions and pooled clients are all queriers
//!
//! ## Example
//!
//! ```ignore
//! use pgstmt::prelude::*;
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! struct Filter {
//!     name: Option<String>,
//!     ids: Vec<i64>,
//! }
//!
//! let search = Query::<User, Filter>::new(
//!     template("SELECT id, name FROM users ? ORDER BY id").bind(where_all([
//!         optional(|f: &Filter| f.name.as_ref(), stmt::<String>("name = ?")).boxed(),
//!         project(|f: &Filter| &f.ids, template::<Vec<i64>>("id IN (?)").bind(list_params(",")))
//!             .boxed(),
//!     ])),
//! )
//! .column("id", scan(|u: &mut User, v: i64| u.id = v))
//! .column("name", scan(|u: &mut User, v: String| u.name = v));
//!
//! // SELECT id, name FROM users WHERE id IN ($1,$2) ORDER BY id
//! let users = search
//!     .all(&client, &Filter { name: None, ids: vec![1, 2] })
//!     .await?;
//! ```
//!
//! Note: `id IN (?)` with an empty list renders `id IN ()`; guard it with [`optional`] or
//! an [`expr`] when the list may be empty.

pub mod arg;
pub mod client;
pub mod cursor;
pub mod error;
pub mod placeholder;
pub mod prelude;
pub mod query;
pub mod scan;
pub mod statement;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(test)]
mod mock;

pub use arg::Arg;
pub use client::{Executor, PgCursor, Querier};
pub use cursor::{RawField, RowCursor, Rows};
pub use error::{BoxError, StmtError, StmtResult};
pub use placeholder::{
    AT_P, COLON, DOLLAR, MARKER, Placeholder, PositionalPlaceholder, QUESTION, StaticPlaceholder,
};
pub use query::{Exec, Query};
pub use scan::{Columns, ScanFn, Scanner, scan, timestamp, try_scan};
pub use statement::{
    BoxStatement, Fragment, Statement, StatementExt, and_group, expr, having_all, join, list,
    list_params, map, map_param, optional, or_group, prefix, project, recursive, stmt, template,
    values, where_all,
};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, create_pool_with_manager_config};
