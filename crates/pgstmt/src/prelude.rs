//! Convenient imports for typical `pgstmt` usage.
//!
//! ```ignore
//! use pgstmt::prelude::*;
//! ```

pub use crate::{
    Arg, Columns, Exec, Executor, Fragment, Placeholder, Querier, Query, Statement, StatementExt,
    StmtError, StmtResult, scan, timestamp, try_scan,
};

pub use crate::statement::{
    and_group, expr, having_all, join, list, list_params, map, map_param, optional, or_group,
    prefix, project, recursive, stmt, template, values, where_all,
};

pub use crate::{AT_P, COLON, DOLLAR, QUESTION};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
