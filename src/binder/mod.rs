// Parameter binder - placeholder scanning, validation, and payload assembly
//
// Scans statement text for qmark (`?`) and named (`:name`) placeholders with
// string literals and comments masked out, validates the supplied parameters
// against the placeholder style and arity, and assembles the wire payload
// entry that the execute/query endpoints accept.

mod scanner;

use serde_json::Value as JsonValue;

use crate::conversion::TypeRegistry;
use crate::conversion::adapt::adapt_value;
use crate::error::RqliteDbError;
use crate::types::Params;

pub(crate) use scanner::mask_literals;

struct PlaceholderScan {
    qmark: usize,
    named: Vec<String>,
}

fn scan_placeholders(masked: &str) -> PlaceholderScan {
    let bytes = masked.as_bytes();
    let mut qmark = 0;
    let mut named = Vec::new();
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'?' => qmark += 1,
            b':' => {
                let start = idx + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
                    end += 1;
                }
                if end > start {
                    // Masked text is plain ASCII in these spans.
                    named.push(masked[start..end].to_string());
                    idx = end - 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    PlaceholderScan { qmark, named }
}

/// Build the wire payload entry for one statement execution.
///
/// The result is a bare JSON string for a parameterless statement,
/// `[sql, v1, v2, ...]` for qmark style, or `[sql, {name: value}]` for named
/// style, ready for JSON encoding into a query or execute request body.
///
/// # Errors
///
/// Returns `RqliteDbError::ProgrammingError` on placeholder/parameter
/// mismatches (wrong arity, mixed or mismatched styles, unresolvable names),
/// and adapter errors for values that cannot be made wire-representable.
pub(crate) fn bind(
    sql: &str,
    params: Option<&Params>,
    registry: &TypeRegistry,
) -> Result<JsonValue, RqliteDbError> {
    let masked = mask_literals(sql);
    let scan = scan_placeholders(&masked);
    let placeholder_count = scan.qmark + scan.named.len();

    let Some(params) = params else {
        if placeholder_count > 0 {
            return Err(RqliteDbError::ProgrammingError(format!(
                "parameter required but not given: {sql}"
            )));
        }
        return Ok(JsonValue::String(sql.to_string()));
    };

    if scan.qmark > 0 && !scan.named.is_empty() {
        return Err(RqliteDbError::ProgrammingError(format!(
            "different parameter types in statement not permitted: {sql}"
        )));
    }

    match params {
        Params::Named(map) => {
            if scan.qmark > 0 {
                return Err(RqliteDbError::ProgrammingError(format!(
                    "unnamed binding used, but named parameters supplied: {sql}"
                )));
            }
            if scan.named.is_empty() {
                return Ok(JsonValue::String(sql.to_string()));
            }
            let mut object = serde_json::Map::new();
            for name in &scan.named {
                let value = map.get(name).ok_or_else(|| {
                    RqliteDbError::ProgrammingError(format!(
                        "named parameter :{name} not supplied for statement: {sql}"
                    ))
                })?;
                object.insert(name.clone(), adapt_value(registry, value)?);
            }
            Ok(JsonValue::Array(vec![
                JsonValue::String(sql.to_string()),
                JsonValue::Object(object),
            ]))
        }
        Params::Positional(values) => {
            if !scan.named.is_empty() {
                return Err(RqliteDbError::ProgrammingError(format!(
                    "named binding used, but a sequence supplied: {sql}"
                )));
            }
            if values.len() != scan.qmark {
                return Err(RqliteDbError::ProgrammingError(format!(
                    "incorrect number of parameters ({} != {}): {sql}",
                    scan.qmark,
                    values.len()
                )));
            }
            if values.is_empty() {
                return Ok(JsonValue::String(sql.to_string()));
            }
            let mut entry = Vec::with_capacity(values.len() + 1);
            entry.push(JsonValue::String(sql.to_string()));
            for value in values {
                entry.push(adapt_value(registry, value)?);
            }
            Ok(JsonValue::Array(entry))
        }
    }
}

/// Bind every parameter set of an `executemany` batch against the same
/// statement. The first failure aborts the whole batch before any request.
///
/// # Errors
///
/// Same conditions as [`bind`], per parameter set.
pub(crate) fn bind_batch(
    sql: &str,
    param_sets: &[Params],
    registry: &TypeRegistry,
) -> Result<Vec<JsonValue>, RqliteDbError> {
    param_sets
        .iter()
        .map(|params| bind(sql, Some(params), registry))
        .collect()
}

/// The statement's leading command keyword, uppercased; decides read/write
/// routing and the rowcount rule.
///
/// # Errors
///
/// Returns `RqliteDbError::ProgrammingError` for an all-whitespace statement.
pub(crate) fn sql_command(sql: &str) -> Result<String, RqliteDbError> {
    sql.split_whitespace()
        .next()
        .map(str::to_uppercase)
        .ok_or_else(|| RqliteDbError::ProgrammingError("cannot execute an empty statement".into()))
}

/// SELECT/PRAGMA-class statements go to the query endpoint; everything else
/// is a write.
pub(crate) fn is_read_command(command: &str) -> bool {
    matches!(command, "SELECT" | "PRAGMA")
}
