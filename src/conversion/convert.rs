use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::error::RqliteDbError;
use crate::types::SqlValue;

use super::{ConverterFn, TypeRegistry};

/// A result-column value as it arrives from the cluster.
///
/// Native wire types reach converters as borrowed JSON values; values routed
/// through the base64 intermediate encoding reach them as decoded bytes.
#[derive(Debug)]
pub enum WireValue<'a> {
    Json(&'a JsonValue),
    Bytes(Vec<u8>),
}

impl WireValue<'_> {
    /// The textual content of this value.
    ///
    /// # Errors
    ///
    /// Returns `RqliteDbError::DatabaseError` when the value is neither a
    /// JSON string nor valid UTF-8 bytes.
    pub fn text(&self) -> Result<String, RqliteDbError> {
        match self {
            WireValue::Json(JsonValue::String(s)) => Ok(s.clone()),
            WireValue::Json(other) => Err(RqliteDbError::DatabaseError(format!(
                "expected a text value, got: {other}"
            ))),
            WireValue::Bytes(bytes) => String::from_utf8(bytes.clone()).map_err(|e| {
                RqliteDbError::DatabaseError(format!("value is not valid UTF-8: {e}"))
            }),
        }
    }
}

/// Wire value types the transport already represents in directly usable
/// form; everything else is decoded from base64 before conversion.
const NATIVE_TYPES: [&str; 9] = [
    "BOOL",
    "FLOAT",
    "INTEGER",
    "REAL",
    "NUMBER",
    "NULL",
    "DATE",
    "DATETIME",
    "TIMESTAMP",
];

// SQLite TEXT affinity: https://www.sqlite.org/datatype3.html
static TEXT_AFFINITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("CHAR|CLOB|TEXT").expect("valid affinity pattern"));

/// Stock converters available to the declared-type and column-name hint
/// modes. Callers extend the set through `register_converter`.
pub(super) fn builtin_converters() -> HashMap<String, ConverterFn> {
    let mut converters: HashMap<String, ConverterFn> = HashMap::new();
    converters.insert("UNICODE".into(), Arc::new(convert_unicode));
    converters.insert("BOOL".into(), Arc::new(convert_bool));
    converters.insert("FLOAT".into(), Arc::new(convert_real));
    converters.insert("DATE".into(), Arc::new(convert_date));
    converters.insert("TIMESTAMP".into(), Arc::new(convert_timestamp));
    converters
}

/// Default converters, keyed by declared type; these apply regardless of the
/// type-detection mode flags.
fn default_converter(type_upper: &str) -> Option<ConverterFn> {
    match type_upper {
        "INTEGER" => Some(Arc::new(convert_int)),
        "REAL" => Some(Arc::new(convert_real)),
        "BLOB" => Some(Arc::new(convert_blob)),
        "NULL" => Some(Arc::new(|_| Ok(SqlValue::Null))),
        "DATE" => Some(Arc::new(convert_date)),
        "DATETIME" | "TIMESTAMP" => Some(Arc::new(convert_timestamp)),
        _ => None,
    }
}

/// Resolve the converter for one result column, or `None` for pass-through.
///
/// Resolution order mirrors the embedded driver: infer a pseudo-type from
/// the column name when no type was declared, apply the fixed default
/// converters, let a registered converter keyed by the truncated declared
/// type override them when `parse_decltypes` is on, and let a bracketed
/// column-name hint override both when `parse_colnames` is on. A selected
/// converter whose key is not a native wire type has its input decoded from
/// base64 first.
#[must_use]
pub fn converter_for(
    registry: &TypeRegistry,
    column_name: &str,
    decl_type: &str,
    parse_decltypes: bool,
    parse_colnames: bool,
) -> Option<ConverterFn> {
    let mut type_str = decl_type.trim().to_string();

    // A blank declared type happens for literal expressions, e.g.
    // `SELECT 3.14` answers column_name="3.14" with no type.
    if type_str.is_empty() {
        if !column_name.is_empty() && column_name.bytes().all(|b| b.is_ascii_digit()) {
            type_str = "INTEGER".to_string();
        } else if is_real_literal(column_name) {
            type_str = "REAL".to_string();
        }
    }

    let mut converter: Option<ConverterFn> = None;
    let mut effective_type: Option<String> = None;

    if !type_str.is_empty() {
        let type_upper = type_str.to_uppercase();
        converter = default_converter(&type_upper);
        effective_type = Some(type_upper.clone());

        if parse_decltypes {
            // Truncate at '(' and blanks so 'NUMBER(10)' and
            // 'INTEGER NOT NULL' resolve as 'NUMBER' and 'INTEGER'.
            let truncated = truncate_decl_type(&type_upper);
            if let Some(registered) = registry.converter(&truncated) {
                converter = Some(registered);
            }
            effective_type = Some(truncated);
        }
    }

    if parse_colnames
        && let Some(hint) = colname_hint(column_name)
    {
        if let Some(registered) = registry.converter(&hint) {
            converter = Some(registered);
        }
        effective_type = Some(hint);
    }

    match converter {
        Some(found) => {
            let key = effective_type.unwrap_or_default();
            if NATIVE_TYPES.contains(&key.as_str()) {
                Some(found)
            } else {
                Some(wrap_base64(found))
            }
        }
        None => match effective_type {
            None => None,
            Some(key) if TEXT_AFFINITY.is_match(&key) => None,
            Some(_) => Some(Arc::new(conditional_base64)),
        },
    }
}

/// Map a wire value to a host value with no converter applied.
#[must_use]
pub(crate) fn wire_to_value(value: &JsonValue) -> SqlValue {
    match value {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Float(f)
            } else {
                SqlValue::Text(n.to_string())
            }
        }
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Strip a bracketed hint suffix from a column name when column-name hinting
/// is enabled: `"x [date]"` -> `"x"`.
#[must_use]
pub(crate) fn column_stripper(column_name: &str, parse_colnames: bool) -> String {
    if parse_colnames {
        column_name
            .split(' ')
            .next()
            .unwrap_or(column_name)
            .to_string()
    } else {
        column_name.to_string()
    }
}

fn truncate_decl_type(type_upper: &str) -> String {
    let before_paren = type_upper.split('(').next().unwrap_or(type_upper);
    before_paren
        .split(' ')
        .next()
        .unwrap_or(before_paren)
        .to_string()
}

fn colname_hint(column_name: &str) -> Option<String> {
    let upper = column_name.to_uppercase();
    let after_bracket = upper.split_once('[')?.1;
    let hint = after_bracket.split_once(']')?.0;
    if hint.is_empty() {
        None
    } else {
        Some(hint.to_string())
    }
}

fn is_real_literal(column_name: &str) -> bool {
    match column_name.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && !frac.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Route a non-native value through base64 before handing it to `inner`.
fn wrap_base64(inner: ConverterFn) -> ConverterFn {
    Arc::new(move |value: WireValue<'_>| {
        let bytes = match value {
            WireValue::Bytes(bytes) => bytes,
            WireValue::Json(JsonValue::String(s)) => BASE64.decode(s).map_err(|e| {
                RqliteDbError::DatabaseError(format!("invalid base64 payload: {e}"))
            })?,
            WireValue::Json(other) => {
                return Err(RqliteDbError::DatabaseError(format!(
                    "expected a base64 string, got: {other}"
                )));
            }
        };
        inner(WireValue::Bytes(bytes))
    })
}

/// Fallback for typed columns with no converter: strings that decode as
/// base64 come back as blobs, anything else passes through.
fn conditional_base64(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    match value {
        WireValue::Bytes(bytes) => Ok(SqlValue::Blob(bytes)),
        WireValue::Json(JsonValue::String(s)) => match BASE64.decode(s) {
            Ok(bytes) => Ok(SqlValue::Blob(bytes)),
            Err(_) => Ok(SqlValue::Text(s.clone())),
        },
        WireValue::Json(other) => Ok(wire_to_value(other)),
    }
}

fn convert_int(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    match &value {
        WireValue::Json(JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(SqlValue::Int(i));
            }
            if let Some(f) = n.as_f64()
                && f.fract() == 0.0
            {
                return Ok(SqlValue::Int(f as i64));
            }
            Err(RqliteDbError::DatabaseError(format!(
                "invalid integer value: {n}"
            )))
        }
        WireValue::Json(JsonValue::Bool(b)) => Ok(SqlValue::Int(i64::from(*b))),
        _ => {
            let text = value.text()?;
            text.trim().parse::<i64>().map(SqlValue::Int).map_err(|e| {
                RqliteDbError::DatabaseError(format!("invalid integer value '{text}': {e}"))
            })
        }
    }
}

fn convert_real(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    match &value {
        WireValue::Json(JsonValue::Number(n)) => n.as_f64().map(SqlValue::Float).ok_or_else(|| {
            RqliteDbError::DatabaseError(format!("invalid real value: {n}"))
        }),
        WireValue::Json(JsonValue::Bool(b)) => Ok(SqlValue::Float(f64::from(u8::from(*b)))),
        _ => {
            let text = value.text()?;
            text.trim()
                .parse::<f64>()
                .map(SqlValue::Float)
                .map_err(|e| {
                    RqliteDbError::DatabaseError(format!("invalid real value '{text}': {e}"))
                })
        }
    }
}

fn convert_unicode(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    Ok(SqlValue::Text(value.text()?))
}

fn convert_bool(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    match &value {
        WireValue::Json(JsonValue::Bool(b)) => Ok(SqlValue::Bool(*b)),
        WireValue::Json(JsonValue::Number(n)) => {
            Ok(SqlValue::Bool(n.as_f64().is_some_and(|f| f != 0.0)))
        }
        WireValue::Json(JsonValue::String(s)) => Ok(SqlValue::Bool(!s.is_empty())),
        WireValue::Json(other) => Err(RqliteDbError::DatabaseError(format!(
            "invalid boolean value: {other}"
        ))),
        WireValue::Bytes(bytes) => Ok(SqlValue::Bool(!bytes.is_empty())),
    }
}

fn convert_blob(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    match value {
        WireValue::Bytes(bytes) => Ok(SqlValue::Blob(bytes)),
        WireValue::Json(JsonValue::String(s)) => Ok(SqlValue::Blob(s.clone().into_bytes())),
        WireValue::Json(other) => Err(RqliteDbError::DatabaseError(format!(
            "invalid blob value: {other}"
        ))),
    }
}

fn convert_date(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    let text = value.text()?;
    let date_part = text.split(['T', ' ']).next().unwrap_or(&text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(SqlValue::Date)
        .map_err(|e| RqliteDbError::DatabaseError(format!("invalid date value '{text}': {e}")))
}

fn convert_timestamp(value: WireValue<'_>) -> Result<SqlValue, RqliteDbError> {
    let text = value.text()?;
    // Accept both the 'T' and space separators, with an optional 'Z'.
    let normalized = text.trim_end_matches('Z').replace('T', " ");
    if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(SqlValue::Timestamp(dt));
    }
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S")
        .map(SqlValue::Timestamp)
        .map_err(|e| {
            RqliteDbError::DatabaseError(format!("invalid timestamp value '{text}': {e}"))
        })
}
