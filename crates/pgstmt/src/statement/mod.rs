//! Composable statement trees.
//!
//! A [`Statement<P>`] resolves a parameter of type `P` into a [`Fragment`]: SQL text that
//! uses the generic `?` marker plus the ordered arguments for those markers. Nodes compose
//! into a tree that is built once and resolved many times:
//!
//! ```ignore
//! use pgstmt::statement::*;
//!
//! struct Filter {
//!     name: Option<String>,
//!     min_age: Option<i32>,
//!     limit: i64,
//! }
//!
//! let search = template::<Filter>("SELECT id, name FROM users ? ORDER BY id ?")
//!     .bind(where_all([
//!         optional(|f: &Filter| f.name.as_ref(), stmt::<String>("name = ?")).boxed(),
//!         optional(|f: &Filter| f.min_age.as_ref(), stmt::<i32>("age >= ?")).boxed(),
//!     ]))
//!     .bind(map(|f: &Filter| f.limit, stmt::<i64>("LIMIT ?")));
//!
//! let fragment = search.to_sql(&Filter { name: None, min_age: Some(18), limit: 10 })?;
//! assert_eq!(fragment.sql, "SELECT id, name FROM users WHERE age >= ? ORDER BY id LIMIT ?");
//! assert_eq!(fragment.args.len(), 2);
//! ```
//!
//! Every node is immutable after construction and can be resolved concurrently.

mod nodes;
mod recursive;
mod template;


pub use nodes::{
    Expr, Group, Join, List, Map, Optional, Prefix, Project, Values, and_group, expr, having_all,
    join, list, list_params, map, map_param, optional, or_group, prefix, project, values,
    where_all,
};
pub use recursive::{Recursive, recursive};
pub use template::{Template, stmt, template};

use crate::arg::Arg;
use crate::error::StmtResult;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Resolved SQL text plus its positional arguments.
///
/// An empty fragment always carries zero arguments.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub sql: String,
    pub args: Vec<Arg>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// SQL text without arguments.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// SQL text with exactly one argument, e.g. `Fragment::bind("age >= ?", 18)`.
    pub fn bind<T>(sql: impl Into<String>, value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        Self::new(sql, vec![Arg::new(value)])
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<Arg>) {
        (self.sql, self.args)
    }
}

/// A node that maps a parameter to a SQL fragment.
pub trait Statement<P: ?Sized>: Send + Sync {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment>;
}

/// Shared, type-erased statement node.
pub type BoxStatement<P> = Arc<dyn Statement<P>>;

impl<P: ?Sized, S: Statement<P> + ?Sized> Statement<P> for Arc<S> {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        (**self).to_sql(param)
    }
}

impl<P: ?Sized, S: Statement<P> + ?Sized> Statement<P> for Box<S> {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        (**self).to_sql(param)
    }
}

/// Conversion into a [`BoxStatement`].
pub trait StatementExt<P: ?Sized>: Statement<P> + Sized + 'static {
    fn boxed(self) -> BoxStatement<P> {
        Arc::new(self)
    }
}

impl<P: ?Sized, S: Statement<P> + 'static> StatementExt<P> for S {}

/// Append `fragment` to `out`, putting `sep` between non-empty pieces.
///
/// Returns `false` (and appends nothing) when the fragment is empty, dropping any
/// arguments it carried.
pub(crate) fn push_joined(out: &mut Fragment, sep: &str, fragment: Fragment) -> bool {
    if fragment.is_empty() {
        return false;
    }

    if !out.sql.is_empty() {
        out.sql.push_str(sep);
    }
    out.sql.push_str(&fragment.sql);
    out.args.extend(fragment.args);
    true
}
