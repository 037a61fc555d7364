//! Error types for pgstmt

use thiserror::Error;

/// Result type alias for pgstmt operations
pub type StmtResult<T> = Result<T, StmtError>;

/// Boxed error returned by user transforms and non-Postgres capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for statement resolution, execution and row scanning
#[derive(Debug, Error)]
pub enum StmtError {
    /// A statement node failed while resolving its fragment
    #[error("Build error: {0}")]
    Build(String),

    /// A recursive statement ran out of depth budget
    #[error("Recursive statement too deep")]
    RecursionDepth,

    /// Placeholder rewriting failed
    #[error("Placeholder rewrite error: {0}")]
    Rewrite(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error reported by the Postgres querier/executor, passed through unchanged
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Error reported by any other querier/executor implementation
    #[error("Driver error: {0}")]
    Driver(#[source] BoxError),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Zero rows where at least one was required
    #[error("No rows in result set")]
    NoRows,

    /// More than one row where exactly one was required
    #[error("Too many rows in result set")]
    TooManyRows,

    /// Column decode/transform error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl StmtError {
    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a placeholder rewrite error
    pub fn rewrite(message: impl Into<String>) -> Self {
        Self::Rewrite(message.into())
    }

    /// Wrap an opaque capability error
    pub fn driver(err: impl Into<BoxError>) -> Self {
        Self::Driver(err.into())
    }

    /// Check if this is a no-rows error
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Check if this is a too-many-rows error
    pub fn is_too_many_rows(&self) -> bool {
        matches!(self, Self::TooManyRows)
    }

    /// Check if this is a recursion depth error
    pub fn is_recursion_depth(&self) -> bool {
        matches!(self, Self::RecursionDepth)
    }

    /// Check if a passed-through Postgres error is a unique violation (SQLSTATE 23505)
    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate() == Some("23505")
    }

    /// SQLSTATE code of a passed-through Postgres server error, if any
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Query(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for StmtError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
