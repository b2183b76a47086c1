// Declared-type cache - table schemas fetched lazily over the transport
//
// The cluster omits a declared type for expression columns; when type
// detection is on and the statement is a plain single-table SELECT, the
// cursor recovers declared types from `PRAGMA table_info`, cached per table
// for the cursor's lifetime. The cache is never refreshed: staleness after a
// schema change is an accepted limitation.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::binder::mask_literals;
use crate::connection::Connection;
use crate::error::RqliteDbError;
use crate::results::decode::{ResponseEnvelope, envelope_from_response};

#[derive(Debug, Default)]
pub(crate) struct DecltypeCache {
    tables: HashMap<String, Arc<HashMap<String, String>>>,
}

impl DecltypeCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Column name -> declared type for a table, fetching on first reference.
    pub(crate) async fn table_types(
        &mut self,
        connection: &Connection,
        table: &str,
    ) -> Result<Arc<HashMap<String, String>>, RqliteDbError> {
        if let Some(found) = self.tables.get(table) {
            return Ok(found.clone());
        }

        let sql = format!("PRAGMA table_info({table})");
        let transport = connection.transport();
        let mut transport = transport.lock().await;
        let mut url = transport.url_for("/db/query")?;
        url.query_pairs_mut().append_pair("q", &sql);
        let response = transport.fetch_response(Method::GET, url, None).await?;
        drop(transport);
        let envelope = envelope_from_response(response).await?;

        let types = Arc::new(table_info_types(&envelope));
        self.tables.insert(table.to_string(), types.clone());
        Ok(types)
    }
}

fn table_info_types(envelope: &ResponseEnvelope) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Some(results) = &envelope.results else {
        return map;
    };
    for item in results {
        let (Some(columns), Some(values)) = (&item.columns, &item.values) else {
            continue;
        };
        let (Some(name_idx), Some(type_idx)) = (
            columns.iter().position(|c| c == "name"),
            columns.iter().position(|c| c == "type"),
        ) else {
            continue;
        };
        for row in values {
            if let (Some(JsonValue::String(name)), Some(JsonValue::String(decl_type))) =
                (row.get(name_idx), row.get(type_idx))
            {
                map.insert(name.clone(), decl_type.clone());
            }
        }
    }
    map
}

/// The single table referenced by a plain SELECT, if there is exactly one.
///
/// Joins, comma lists, and subqueries return `None`; the cache only serves
/// the simple case.
pub(crate) fn table_from_select(sql: &str) -> Option<String> {
    let masked = mask_literals(sql);
    let mut tokens = masked.split_whitespace();

    loop {
        let token = tokens.next()?;
        if token.eq_ignore_ascii_case("from") {
            break;
        }
    }

    let candidate = tokens.next()?;
    if candidate.contains(',') {
        return None;
    }
    let table = candidate.trim_end_matches(';');
    let mut chars = table.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_')
        || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    for rest in tokens {
        let lower = rest.to_ascii_lowercase();
        if lower.starts_with(',')
            || matches!(
                lower.as_str(),
                "join" | "inner" | "left" | "right" | "full" | "cross" | "natural"
            )
        {
            return None;
        }
        if matches!(lower.as_str(), "where" | "group" | "order" | "limit") {
            break;
        }
    }

    Some(table.to_string())
}
