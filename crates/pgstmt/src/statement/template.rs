use super::{BoxStatement, Fragment, Statement, StatementExt};
use crate::arg::{Arg, bind_param};
use crate::error::{StmtError, StmtResult};
use crate::placeholder::MARKER;
use tokio_postgres::types::ToSql;

/// Literal SQL text with one optional child binding per `?` marker.
///
/// Resolution scans the text left to right:
///
/// - `??` is kept as an escaped literal marker and consumes no binding.
/// - A marker with no binding emits `?` and binds the parameter itself (only
///   available for templates created with [`stmt`]).
/// - A marker bound to a child is replaced by the child's fragment. If the child is
///   empty, the marker and one following space disappear.
///
/// Bindings left over after the last marker are appended, space separated, when non-empty.
/// The result is trimmed.
pub struct Template<P: ?Sized> {
    sql: String,
    bindings: Vec<Option<BoxStatement<P>>>,
    param: Option<fn(&P) -> Arg>,
}

/// A template whose unbound markers bind the parameter itself.
///
/// ```ignore
/// let by_id = stmt::<i64>("SELECT * FROM users WHERE id = ?");
/// ```
pub fn stmt<P>(sql: impl Into<String>) -> Template<P>
where
    P: ToSql + Clone + Send + Sync + 'static,
{
    Template {
        sql: sql.into(),
        bindings: Vec::new(),
        param: Some(bind_param::<P>),
    }
}

/// A template for parameters that are not bind values themselves (structs, tuples...).
///
/// Every marker must be bound to a child; an unbound marker fails resolution.
pub fn template<P: ?Sized>(sql: impl Into<String>) -> Template<P> {
    Template {
        sql: sql.into(),
        bindings: Vec::new(),
        param: None,
    }
}

impl<P: ?Sized> Template<P> {
    /// Bind the next marker (or trailing clause) to a child statement.
    pub fn bind(mut self, statement: impl Statement<P> + 'static) -> Self {
        self.bindings.push(Some(statement.boxed()));
        self
    }

    /// Bind the next marker to an already shared child statement.
    pub fn bind_shared(mut self, statement: BoxStatement<P>) -> Self {
        self.bindings.push(Some(statement));
        self
    }

    /// Leave the next marker unbound.
    pub fn skip(mut self) -> Self {
        self.bindings.push(None);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl<P: ?Sized> Statement<P> for Template<P> {
    fn to_sql(&self, param: &P) -> StmtResult<Fragment> {
        let mut sql = String::with_capacity(self.sql.len());
        let mut args = Vec::with_capacity(self.bindings.len());
        let mut rest = self.sql.as_str();
        let mut next = 0;

        while let Some(pos) = rest.find(MARKER) {
            sql.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if after.starts_with(MARKER) {
                sql.push_str("??");
                rest = &after[1..];
                continue;
            }

            rest = after;
            let binding = self.bindings.get(next);
            next += 1;

            match binding {
                Some(Some(child)) => {
                    let fragment = child.to_sql(param)?;
                    if fragment.is_empty() {
                        rest = rest.strip_prefix(' ').unwrap_or(rest);
                        continue;
                    }
                    sql.push_str(&fragment.sql);
                    args.extend(fragment.args);
                }
                _ => {
                    let bind = self.param.ok_or_else(|| {
                        StmtError::build(format!("placeholder {next} in template has no binding"))
                    })?;
                    sql.push(MARKER);
                    args.push(bind(param));
                }
            }
        }
        sql.push_str(rest);

        for child in self.bindings.iter().skip(next).flatten() {
            let fragment = child.to_sql(param)?;
            if fragment.is_empty() {
                continue;
            }
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(&fragment.sql);
            args.extend(fragment.args);
        }

        let trimmed = sql.trim();
        if trimmed.len() != sql.len() {
            sql = trimmed.to_string();
        }
        if sql.is_empty() {
            args.clear();
        }

        Ok(Fragment { sql, args })
    }
}
