//! Bind arguments produced by statement resolution.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly, type-erased bind value.
///
/// Statements are resolved against borrowed parameters, so every argument they
/// emit is owned and shared through an `Arc`. Cloning an `Arg` never copies the value.
#[derive(Clone)]
pub struct Arg(Arc<dyn ToSql + Send + Sync>);

impl Arg {
    /// Create a new argument from any `ToSql` value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Arg(Arc::new(value))
    }

    /// Get a reference to the inner value as a `ToSql` trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }

    /// Collect borrowed parameter refs in the shape `tokio-postgres` expects.
    pub fn refs(args: &[Arg]) -> Vec<&(dyn ToSql + Sync)> {
        args.iter().map(Arg::as_ref).collect()
    }
}

impl std::fmt::Debug for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `ToSql` requires `Debug`, so the bound value can be shown as-is.
        f.debug_tuple("Arg").field(&self.0).finish()
    }
}

/// Turns a parameter into a single argument.
///
/// Used by nodes that bind the caller's parameter itself behind one marker.
pub(crate) fn bind_param<P>(param: &P) -> Arg
where
    P: ToSql + Clone + Send + Sync + 'static,
{
    Arg::new(param.clone())
}
