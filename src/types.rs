use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

/// Optional capability for caller-defined parameter types.
///
/// A value the adapter registry does not recognize is asked to describe its
/// own wire form through this trait before the registry gives up with an
/// interface error. This replaces the duck-typed self-adaptation protocol of
/// the embedded driver with an explicit seam:
/// ```rust
/// use rqlite_client::prelude::*;
/// use serde_json::Value as JsonValue;
///
/// #[derive(Debug)]
/// struct Point { x: f64, y: f64 }
///
/// impl ToWireValue for Point {
///     fn to_wire_value(&self) -> Option<JsonValue> {
///         Some(JsonValue::String(format!("{};{}", self.x, self.y)))
///     }
/// }
/// ```
pub trait ToWireValue: fmt::Debug + Send + Sync {
    /// Produce the wire-ready JSON form of this value, or `None` when the
    /// value cannot describe itself.
    fn to_wire_value(&self) -> Option<JsonValue>;
}

/// Values that can be bound as query parameters or read from a result row.
///
/// Reuse the same enum on both sides so helper functions do not need to
/// branch between parameter and result types:
/// ```rust
/// use rqlite_client::prelude::*;
///
/// let params = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Calendar date value
    Date(NaiveDate),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// Binary data
    Blob(Vec<u8>),
    /// Caller-defined value that adapts itself via [`ToWireValue`]
    Custom(Arc<dyn ToWireValue>),
}

/// Fieldless discriminant of [`SqlValue`], used as the adapter registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    Text,
    Bool,
    Date,
    Timestamp,
    Null,
    Blob,
    Custom,
}

impl SqlValue {
    /// The registry key for this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            SqlValue::Int(_) => ValueKind::Int,
            SqlValue::Float(_) => ValueKind::Float,
            SqlValue::Text(_) => ValueKind::Text,
            SqlValue::Bool(_) => ValueKind::Bool,
            SqlValue::Date(_) => ValueKind::Date,
            SqlValue::Timestamp(_) => ValueKind::Timestamp,
            SqlValue::Null => ValueKind::Null,
            SqlValue::Blob(_) => ValueKind::Blob,
            SqlValue::Custom(_) => ValueKind::Custom,
        }
    }

    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let SqlValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        if let SqlValue::Date(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(d);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl PartialEq for SqlValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SqlValue::Int(a), SqlValue::Int(b)) => a == b,
            (SqlValue::Float(a), SqlValue::Float(b)) => a == b,
            (SqlValue::Text(a), SqlValue::Text(b)) => a == b,
            (SqlValue::Bool(a), SqlValue::Bool(b)) => a == b,
            (SqlValue::Date(a), SqlValue::Date(b)) => a == b,
            (SqlValue::Timestamp(a), SqlValue::Timestamp(b)) => a == b,
            (SqlValue::Null, SqlValue::Null) => true,
            (SqlValue::Blob(a), SqlValue::Blob(b)) => a == b,
            // Custom values carry no equality of their own.
            _ => false,
        }
    }
}

/// Parameters for a single statement execution.
///
/// Qmark (`?`) statements take the positional form; named (`:name`)
/// statements take the map form. The binder rejects a mismatch between the
/// statement's placeholder style and the form supplied here.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Positional parameters for `?` placeholders, in order.
    Positional(Vec<SqlValue>),
    /// Named parameters for `:name` placeholders, keyed without the colon.
    Named(HashMap<String, SqlValue>),
}

impl Params {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Positional(values) => values.is_empty(),
            Params::Named(map) => map.is_empty(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }
}

impl From<Vec<SqlValue>> for Params {
    fn from(values: Vec<SqlValue>) -> Self {
        Params::Positional(values)
    }
}

impl<const N: usize> From<[SqlValue; N]> for Params {
    fn from(values: [SqlValue; N]) -> Self {
        Params::Positional(values.into())
    }
}

impl From<HashMap<String, SqlValue>> for Params {
    fn from(map: HashMap<String, SqlValue>) -> Self {
        Params::Named(map)
    }
}
