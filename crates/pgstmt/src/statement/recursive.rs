use super::{Fragment, Statement};
use crate::error::{StmtError, StmtResult};
use std::sync::Arc;

type Build<P> = dyn Fn(&Recursive<P>, &P) -> StmtResult<Fragment> + Send + Sync;

/// A statement that can refer to itself, bounded by a depth budget.
///
/// Every resolution spends one unit of budget and hands the builder a copy of the node
/// with the remaining budget. The builder may see a budget of `-1`; resolving a node whose
/// budget is already negative fails with [`StmtError::RecursionDepth`], so nesting driven by
/// untrusted input cannot expand without bound.
pub struct Recursive<P: ?Sized> {
    depth: isize,
    build: Arc<Build<P>>,
}

/// Create a self-referencing statement allowed to nest `depth` times below the outermost
/// invocation. `recursive(0, ..)` renders once and fails only if the builder recurses.
///
/// ```ignore
/// enum Cond { Eq(&'static str, i64), And(Vec<Cond>), Or(Vec<Cond>) }
///
/// let cond = recursive(8, |this, c: &Cond| match c {
///     Cond::Eq(col, v) => Ok(Fragment::bind(format!("{col} = ?"), *v)),
///     Cond::And(items) => list(" AND ", this.clone()).to_sql(items).map(paren),
///     Cond::Or(items) => list(" OR ", this.clone()).to_sql(items).map(paren),
/// });
/// ```
pub fn recursive<P, F>(depth: usize, build: F) -> Recursive<P>
where
    P: ?Sized,
    F: Fn(&Recursive<P>, &P) -> StmtResult<Fragment> + Send + Sync + 'static,
{
    Recursive {
        depth: isize::try_from(depth).unwrap_or(isize::MAX),
        build: Arc::new(build),
    }
}

impl<P: ?Sized> Recursive<P> {
    /// Remaining nesting budget. Negative once it is spent.
    pub fn depth(&self) -> isize {
        self.depth
    }
}

impl<P: ?Sized> Clone for Recursive<P> {
    fn clone(&self) -> Self {
        Self {
            depth: self.depth,
            build: Arc::clone(&self.build),
        }
    }
}

impl<P: ?Sized> Statement<P> for Recursive<P> {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        if self.depth < 0 {
            return Err(StmtError::RecursionDepth);
        }

        let next = Recursive {
            depth: self.depth - 1,
            build: Arc::clone(&self.build),
        };
        (self.build)(&next, param)
    }
}
