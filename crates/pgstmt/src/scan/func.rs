use super::{Column, Scanner, decode};
use crate::cursor::RawField;
use crate::error::BoxError;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_postgres::types::FromSql;

type Apply<V, T> = dyn Fn(&mut T, V) -> Result<(), BoxError> + Send + Sync;

/// A scanner built from a function that applies a decoded `V` onto a `T`.
///
/// `V` is the staging type: the value decoded from the raw column. Adapters such as
/// [`ScanFn::from_text`] or [`ScanFn::json`] change the staging type while keeping the
/// final setter.
pub struct ScanFn<V, T> {
    f: Arc<Apply<V, T>>,
}

impl<V, T> Clone for ScanFn<V, T> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

/// Scan a column of type `V` with an infallible setter.
pub fn scan<V, T, F>(f: F) -> ScanFn<V, T>
where
    F: Fn(&mut T, V) + Send + Sync + 'static,
{
    ScanFn {
        f: Arc::new(move |t: &mut T, v: V| {
            f(t, v);
            Ok(())
        }),
    }
}

/// Scan a column of type `V` with a fallible transform.
pub fn try_scan<V, T, F, E>(f: F) -> ScanFn<V, T>
where
    F: Fn(&mut T, V) -> Result<(), E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    ScanFn {
        f: Arc::new(move |t: &mut T, v: V| f(t, v).map_err(Into::into)),
    }
}

/// Scan a text column holding a timestamp in the given `chrono` layout.
///
/// ```ignore
/// let joined = timestamp("%Y-%m-%d %H:%M:%S", scan(|u: &mut User, v| u.joined = v));
/// ```
pub fn timestamp<T: 'static>(
    layout: impl Into<String>,
    f: ScanFn<NaiveDateTime, T>,
) -> ScanFn<String, T> {
    let layout = layout.into();
    f.from_text(move |s| NaiveDateTime::parse_from_str(s, &layout))
}

impl<V: 'static, T: 'static> ScanFn<V, T> {
    /// Apply a value directly, bypassing the cursor.
    pub fn call(&self, target: &mut T, value: V) -> Result<(), BoxError> {
        (self.f)(target, value)
    }

    /// Accept NULL: an absent value applies `default` instead.
    pub fn nullable(self, default: V) -> ScanFn<Option<V>, T>
    where
        V: Clone + Send + Sync,
    {
        let f = self.f;
        ScanFn {
            f: Arc::new(move |t: &mut T, v: Option<V>| f(t, v.unwrap_or_else(|| default.clone()))),
        }
    }

    /// Stage the column as text and parse it into `V`.
    pub fn from_text<E, F>(self, parse: F) -> ScanFn<String, T>
    where
        F: Fn(&str) -> Result<V, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let f = self.f;
        ScanFn {
            f: Arc::new(move |t: &mut T, s: String| {
                let v = parse(&s).map_err(Into::into)?;
                f(t, v)
            }),
        }
    }

    /// Stage the column as bytes and decode them into `V`.
    pub fn from_bytes<E, F>(self, parse: F) -> ScanFn<Vec<u8>, T>
    where
        F: Fn(&[u8]) -> Result<V, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let f = self.f;
        ScanFn {
            f: Arc::new(move |t: &mut T, b: Vec<u8>| {
                let v = parse(&b).map_err(Into::into)?;
                f(t, v)
            }),
        }
    }

    /// Stage a `json`/`jsonb` column and deserialize it into `V`.
    pub fn json(self) -> ScanFn<serde_json::Value, T>
    where
        V: DeserializeOwned,
    {
        let f = self.f;
        ScanFn {
            f: Arc::new(move |t: &mut T, value: serde_json::Value| {
                let v = serde_json::from_value(value)?;
                f(t, v)
            }),
        }
    }

    /// Stage a text column holding JSON and deserialize it into `V`.
    pub fn json_text(self) -> ScanFn<String, T>
    where
        V: DeserializeOwned,
    {
        self.from_text(|s| serde_json::from_str(s))
    }
}

/// The per-execution slot of a [`ScanFn`].
struct Slot<V, T> {
    value: Option<V>,
    f: Arc<Apply<V, T>>,
}

impl<V, T> Column<T> for Slot<V, T>
where
    V: for<'a> FromSql<'a> + Send,
{
    fn stage(&mut self, field: RawField<'_>) -> Result<(), BoxError> {
        self.value = Some(decode::<V>(&field)?);
        Ok(())
    }

    fn apply(&mut self, target: &mut T) -> Result<(), BoxError> {
        let value = self
            .value
            .take()
            .ok_or("no value staged for the current row")?;
        (self.f)(target, value)
    }
}

impl<V, T> Scanner<T> for ScanFn<V, T>
where
    V: for<'a> FromSql<'a> + Send + 'static,
    T: 'static,
{
    fn scan(&self) -> Box<dyn Column<T>> {
        Box::new(Slot {
            value: None,
            f: Arc::clone(&self.f),
        })
    }
}
