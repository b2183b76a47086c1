use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::conversion::convert::{column_stripper, wire_to_value};
use crate::conversion::{ConverterFn, TypeRegistry, WireValue, converter_for};
use crate::error::RqliteDbError;

use super::result_set::{ColumnDescriptor, ResultSet};
use super::row::{Row, first_match_cache};

/// Top-level JSON response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseEnvelope {
    pub results: Option<Vec<StatementResult>>,
}

/// One per-statement result inside the envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct StatementResult {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub values: Option<Vec<Vec<JsonValue>>>,
    #[serde(default)]
    pub rows_affected: Option<i64>,
    #[serde(default)]
    pub last_insert_id: Option<i64>,
}

pub(crate) struct DecodeContext<'a> {
    pub registry: &'a TypeRegistry,
    pub parse_decltypes: bool,
    pub parse_colnames: bool,
    /// Declared types recovered from the schema cache for result columns the
    /// envelope reports without a type, keyed by stripped column name.
    pub supplemental_types: Option<&'a HashMap<String, String>>,
}

/// Check the HTTP status and parse the response body into an envelope.
///
/// # Errors
///
/// Returns `RqliteDbError::OperationalError` for a non-success status (which
/// includes a redirect that survived the transport's redirect budget), or a
/// JSON error for an unparsable body.
pub(crate) async fn envelope_from_response(
    response: reqwest::Response,
) -> Result<ResponseEnvelope, RqliteDbError> {
    let status = response.status();
    if !status.is_success() {
        return Err(RqliteDbError::OperationalError(format!(
            "received unexpected http status: {status}"
        )));
    }
    let text = response.text().await?;
    tracing::debug!(response = %text, "raw response");
    Ok(serde_json::from_str(&text)?)
}

/// Decode a response envelope into rows, column metadata, and counters.
///
/// Any per-statement error entry aborts decoding and raises immediately with
/// the serialized error payload; no partially-decoded rows are returned.
///
/// # Errors
///
/// Returns `RqliteDbError::DatabaseError` for per-statement errors, or
/// conversion errors from the resolved column converters.
pub(crate) fn decode_envelope(
    envelope: &ResponseEnvelope,
    ctx: &DecodeContext<'_>,
) -> Result<ResultSet, RqliteDbError> {
    let mut rows_affected: i64 = -1;
    let mut last_insert_id = None;
    let mut payload_rows: Option<&StatementResult> = None;

    if let Some(results) = &envelope.results {
        rows_affected = 0;
        for item in results {
            if let Some(error) = &item.error {
                let detail = serde_json::json!({ "error": error }).to_string();
                tracing::error!(error = %detail, "statement failed on the cluster");
                return Err(RqliteDbError::DatabaseError(detail));
            }
            if let Some(n) = item.rows_affected {
                rows_affected += n;
            }
            if let Some(id) = item.last_insert_id {
                last_insert_id = Some(id);
            }
            if item.columns.is_some() {
                payload_rows = Some(item);
            }
        }
    }

    let mut result_set = ResultSet {
        columns: None,
        rows: Vec::new(),
        rows_affected,
        last_insert_id,
    };

    let Some(item) = payload_rows else {
        return Ok(result_set);
    };
    let Some(fields) = &item.columns else {
        return Ok(result_set);
    };

    let mut descriptors = Vec::with_capacity(fields.len());
    let mut converters: Vec<Option<ConverterFn>> = Vec::with_capacity(fields.len());
    let mut stripped_names = Vec::with_capacity(fields.len());

    for (idx, field) in fields.iter().enumerate() {
        let stripped = column_stripper(field, ctx.parse_colnames);
        let mut decl_type = item
            .types
            .as_ref()
            .and_then(|types| types.get(idx))
            .cloned()
            .unwrap_or_default();
        if decl_type.is_empty()
            && let Some(supplemental) = ctx.supplemental_types
            && let Some(found) = supplemental.get(&stripped)
        {
            decl_type = found.clone();
        }

        converters.push(converter_for(
            ctx.registry,
            field,
            &decl_type,
            ctx.parse_decltypes,
            ctx.parse_colnames,
        ));
        descriptors.push(ColumnDescriptor {
            name: stripped.clone(),
            decl_type: if decl_type.is_empty() {
                None
            } else {
                Some(decl_type)
            },
        });
        stripped_names.push(stripped);
    }

    let column_names = Arc::new(stripped_names);
    let index_cache = Arc::new(first_match_cache(&column_names));

    if let Some(values) = &item.values {
        result_set.rows.reserve(values.len());
        for payload_row in values {
            let mut row_values = Vec::with_capacity(fields.len());
            for (idx, converter) in converters.iter().enumerate() {
                let value = payload_row.get(idx).unwrap_or(&JsonValue::Null);
                let converted = if value.is_null() {
                    crate::types::SqlValue::Null
                } else {
                    match converter {
                        Some(convert) => convert(WireValue::Json(value))?,
                        None => wire_to_value(value),
                    }
                };
                row_values.push(converted);
            }
            result_set.rows.push(Row::from_parts(
                column_names.clone(),
                index_cache.clone(),
                row_values,
            ));
        }
    }

    result_set.columns = Some(descriptors);
    Ok(result_set)
}
