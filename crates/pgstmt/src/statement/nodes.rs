use super::{BoxStatement, Fragment, Statement, StatementExt, push_joined};
use crate::arg::{Arg, bind_param};
use crate::error::StmtResult;
use crate::placeholder::MARKER;
use tokio_postgres::types::ToSql;

/// What a [`List`] or [`Map`] applies to its (transformed) parameter.
enum Target<Q: ?Sized> {
    Statement(BoxStatement<Q>),
    Param(fn(&Q) -> Arg),
}

impl<Q: ?Sized> Target<Q> {
    fn to_sql(&self, param: &Q) -> StmtResult<Fragment> {
        match self {
            Target::Statement(statement) => statement.to_sql(param),
            Target::Param(bind) => Ok(Fragment::new(MARKER.to_string(), vec![bind(param)])),
        }
    }
}

// ==================== Expr ====================

/// A closure leaf for application-specific SQL.
pub struct Expr<F>(F);

/// Wrap a closure as a statement.
///
/// ```ignore
/// let active = expr(|f: &Filter| {
///     Ok(if f.only_active { Fragment::raw("deleted_at IS NULL") } else { Fragment::empty() })
/// });
/// ```
pub fn expr<P, F>(f: F) -> Expr<F>
where
    P: ?Sized,
    F: Fn(&P) -> StmtResult<Fragment> + Send + Sync,
{
    Expr(f)
}

impl<P, F> Statement<P> for Expr<F>
where
    P: ?Sized,
    F: Fn(&P) -> StmtResult<Fragment> + Send + Sync,
{
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        let fragment = (self.0)(param)?;
        if fragment.is_empty() {
            return Ok(Fragment::empty());
        }
        Ok(fragment)
    }
}

// ==================== Prefix ====================

/// A keyword in front of a child; elided entirely when the child is empty.
pub struct Prefix<P: ?Sized> {
    prefix: String,
    inner: BoxStatement<P>,
}

pub fn prefix<P: ?Sized>(
    prefix: impl Into<String>,
    inner: impl Statement<P> + 'static,
) -> Prefix<P> {
    Prefix {
        prefix: prefix.into(),
        inner: inner.boxed(),
    }
}

impl<P: ?Sized> Statement<P> for Prefix<P> {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        let fragment = self.inner.to_sql(param)?;
        if fragment.is_empty() {
            return Ok(Fragment::empty());
        }

        let mut sql = String::with_capacity(self.prefix.len() + 1 + fragment.sql.len());
        sql.push_str(&self.prefix);
        sql.push(' ');
        sql.push_str(&fragment.sql);
        Ok(Fragment::new(sql, fragment.args))
    }
}

// ==================== Join ====================

/// Children joined by a separator, skipping empty ones.
pub struct Join<P: ?Sized> {
    sep: String,
    children: Vec<BoxStatement<P>>,
}

pub fn join<P: ?Sized>(
    sep: impl Into<String>,
    children: impl IntoIterator<Item = BoxStatement<P>>,
) -> Join<P> {
    Join {
        sep: sep.into(),
        children: children.into_iter().collect(),
    }
}

impl<P: ?Sized> Join<P> {
    /// Append another child.
    pub fn push(mut self, child: impl Statement<P> + 'static) -> Self {
        self.children.push(child.boxed());
        self
    }
}

impl<P: ?Sized> Statement<P> for Join<P> {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        let mut out = Fragment::empty();
        for child in &self.children {
            push_joined(&mut out, &self.sep, child.to_sql(param)?);
        }
        Ok(out)
    }
}

/// `WHERE a AND b ...`, or nothing when every condition is empty.
pub fn where_all<P: ?Sized + 'static>(
    conditions: impl IntoIterator<Item = BoxStatement<P>>,
) -> Prefix<P> {
    prefix("WHERE", join(" AND ", conditions))
}

/// `HAVING a AND b ...`, or nothing when every condition is empty.
pub fn having_all<P: ?Sized + 'static>(
    conditions: impl IntoIterator<Item = BoxStatement<P>>,
) -> Prefix<P> {
    prefix("HAVING", join(" AND ", conditions))
}

// ==================== Group ====================

/// A parenthesised join; elided when every child is empty.
pub struct Group<P: ?Sized> {
    inner: Join<P>,
}

/// `(a AND b ...)`
pub fn and_group<P: ?Sized>(conditions: impl IntoIterator<Item = BoxStatement<P>>) -> Group<P> {
    Group {
        inner: join(" AND ", conditions),
    }
}

/// `(a OR b ...)`
pub fn or_group<P: ?Sized>(conditions: impl IntoIterator<Item = BoxStatement<P>>) -> Group<P> {
    Group {
        inner: join(" OR ", conditions),
    }
}

impl<P: ?Sized> Statement<P> for Group<P> {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        let fragment = self.inner.to_sql(param)?;
        if fragment.is_empty() {
            return Ok(fragment);
        }
        Ok(Fragment::new(format!("({})", fragment.sql), fragment.args))
    }
}

// ==================== List ====================

/// One child applied to every element of a sequence parameter.
///
/// Implements both `Statement<[P]>` and `Statement<Vec<P>>`.
pub struct List<P> {
    sep: String,
    item: Target<P>,
}

/// Apply `item` to each element, joining the non-empty results with `sep`.
///
/// ```ignore
/// // (?,?),(?,?),(?,?)
/// let rows = list(",", template::<(i64, String)>("(?,?)")
///     .bind(map_param(|r: &(i64, String)| r.0))
///     .bind(map_param(|r: &(i64, String)| r.1.clone())));
/// ```
pub fn list<P: 'static>(sep: impl Into<String>, item: impl Statement<P> + 'static) -> List<P> {
    List {
        sep: sep.into(),
        item: Target::Statement(item.boxed()),
    }
}

/// One `?` per element, each element bound as its own argument.
///
/// ```ignore
/// // id IN (?,?,?)
/// let ids = template::<Vec<i64>>("id IN (?)").bind(list_params(","));
/// ```
pub fn list_params<P>(sep: impl Into<String>) -> List<P>
where
    P: ToSql + Clone + Send + Sync + 'static,
{
    List {
        sep: sep.into(),
        item: Target::Param(bind_param::<P>),
    }
}

impl<P> List<P> {
    fn resolve(&self, elements: &[P]) -> StmtResult<Fragment> {
        let mut out = Fragment {
            sql: String::new(),
            args: Vec::with_capacity(elements.len()),
        };
        for element in elements {
            push_joined(&mut out, &self.sep, self.item.to_sql(element)?);
        }
        Ok(out)
    }
}

impl<P> Statement<[P]> for List<P> {
    fn to_sql(&self, param: &[P]) -> StmtResult<Fragment> {
        self.resolve(param)
    }
}

impl<P> Statement<Vec<P>> for List<P> {
    fn to_sql(&self, param: &Vec<P>) -> StmtResult<Fragment> {
        self.resolve(param)
    }
}

// ==================== Map / Project ====================

/// Adapts the parameter into another type for a wrapped statement.
pub struct Map<Q, F> {
    f: F,
    target: Target<Q>,
}

/// Transform the parameter before resolving `inner` against the result.
pub fn map<P, Q, F>(f: F, inner: impl Statement<Q> + 'static) -> Map<Q, F>
where
    P: ?Sized,
    Q: 'static,
    F: Fn(&P) -> Q + Send + Sync,
{
    Map {
        f,
        target: Target::Statement(inner.boxed()),
    }
}

/// Transform the parameter and bind the result behind a single `?`.
pub fn map_param<P, Q, F>(f: F) -> Map<Q, F>
where
    P: ?Sized,
    Q: ToSql + Clone + Send + Sync + 'static,
    F: Fn(&P) -> Q + Send + Sync,
{
    Map {
        f,
        target: Target::Param(bind_param::<Q>),
    }
}

impl<P, Q, F> Statement<P> for Map<Q, F>
where
    P: ?Sized,
    F: Fn(&P) -> Q + Send + Sync,
{
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        let inner = (self.f)(param);
        self.target.to_sql(&inner)
    }
}

/// The borrowing form of [`Map`]: the wrapped statement sees a part of the parameter.
pub struct Project<Q: ?Sized, F> {
    f: F,
    inner: BoxStatement<Q>,
}

/// Resolve `inner` against a borrowed part of the parameter.
///
/// ```ignore
/// let ids = project(|f: &Filter| &f.ids, template::<Vec<i64>>("id IN (?)").bind(list_params(",")));
/// ```
pub fn project<P, Q, F>(f: F, inner: impl Statement<Q> + 'static) -> Project<Q, F>
where
    P: ?Sized,
    Q: ?Sized + 'static,
    F: for<'a> Fn(&'a P) -> &'a Q + Send + Sync,
{
    Project {
        f,
        inner: inner.boxed(),
    }
}

impl<P, Q, F> Statement<P> for Project<Q, F>
where
    P: ?Sized,
    Q: ?Sized,
    F: for<'a> Fn(&'a P) -> &'a Q + Send + Sync,
{
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        self.inner.to_sql((self.f)(param))
    }
}

// ==================== Optional ====================

/// Resolves a child against an optional part of the parameter; elided when absent.
pub struct Optional<Q: ?Sized, F> {
    f: F,
    inner: BoxStatement<Q>,
}

/// ```ignore
/// let by_name = optional(|f: &Filter| f.name.as_ref(), stmt::<String>("name = ?"));
/// ```
pub fn optional<P, Q, F>(f: F, inner: impl Statement<Q> + 'static) -> Optional<Q, F>
where
    P: ?Sized,
    Q: ?Sized + 'static,
    F: for<'a> Fn(&'a P) -> Option<&'a Q> + Send + Sync,
{
    Optional {
        f,
        inner: inner.boxed(),
    }
}

impl<P, Q, F> Statement<P> for Optional<Q, F>
where
    P: ?Sized,
    Q: ?Sized,
    F: for<'a> Fn(&'a P) -> Option<&'a Q> + Send + Sync,
{
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        match (self.f)(param) {
            Some(value) => self.inner.to_sql(value),
            None => Ok(Fragment::empty()),
        }
    }
}

// ==================== Values ====================

/// A `(?,?,...)` tuple built from a list of arguments; elided when the list is empty.
pub struct Values<F>(F);

/// ```ignore
/// let row = values(|u: &NewUser| vec![Arg::new(u.name.clone()), Arg::new(u.age)]);
/// ```
pub fn values<P, F>(f: F) -> Values<F>
where
    P: ?Sized,
    F: Fn(&P) -> Vec<Arg> + Send + Sync,
{
    Values(f)
}

impl<P, F> Statement<P> for Values<F>
where
    P: ?Sized,
    F: Fn(&P) -> Vec<Arg> + Send + Sync,
{
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        let args = (self.0)(param);
        if args.is_empty() {
            return Ok(Fragment::empty());
        }

        let mut sql = String::with_capacity(args.len() * 2 + 1);
        sql.push('(');
        for i in 0..args.len() {
            if i > 0 {
                sql.push(',');
            }
            sql.push(MARKER);
        }
        sql.push(')');
        Ok(Fragment::new(sql, args))
    }
}
