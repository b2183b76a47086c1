use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::RqliteDbError;
use crate::types::SqlValue;

use super::TypeRegistry;

/// Adapt a host value into its wire-representable JSON form.
///
/// A registered adapter for the value's kind wins; otherwise the built-in
/// rules apply: booleans become 0/1 integers, dates and timestamps become
/// ISO-8601 strings (space-separated date and time, so they round-trip with
/// the converter side), blobs become JSON arrays of byte integers, and the
/// remaining primitives pass through. Custom values are asked to describe
/// themselves via `ToWireValue`; refusal is an interface error.
///
/// # Errors
///
/// Returns `RqliteDbError::InterfaceError` for a value that cannot be
/// adapted, or whatever error a registered adapter raises.
pub fn adapt_value(registry: &TypeRegistry, value: &SqlValue) -> Result<JsonValue, RqliteDbError> {
    if let Some(adapter) = registry.adapter(value.kind()) {
        return adapter(value);
    }

    match value {
        SqlValue::Null => Ok(JsonValue::Null),
        SqlValue::Int(i) => Ok(JsonValue::from(*i)),
        SqlValue::Float(f) => Ok(JsonValue::from(*f)),
        SqlValue::Text(s) => Ok(JsonValue::String(s.clone())),
        SqlValue::Bool(b) => Ok(JsonValue::from(i64::from(*b))),
        SqlValue::Date(d) => Ok(JsonValue::String(d.format("%Y-%m-%d").to_string())),
        SqlValue::Timestamp(dt) => Ok(JsonValue::String(format_timestamp(dt))),
        SqlValue::Blob(bytes) => Ok(JsonValue::Array(
            bytes.iter().map(|b| JsonValue::from(*b)).collect(),
        )),
        SqlValue::Custom(custom) => custom.to_wire_value().ok_or_else(|| {
            RqliteDbError::InterfaceError(format!(
                "value {custom:?} does not describe a wire representation"
            ))
        }),
    }
}

/// Space-separated ISO timestamp; fractional seconds only when present.
pub(crate) fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format("%F %T%.f").to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::json;

    use super::*;
    use crate::types::{ToWireValue, ValueKind};

    fn adapt(value: &SqlValue) -> JsonValue {
        adapt_value(&TypeRegistry::default(), value).expect("adapt")
    }

    #[test]
    fn primitives_pass_through() {
        assert_eq!(adapt(&SqlValue::Int(42)), json!(42));
        assert_eq!(adapt(&SqlValue::Float(3.5)), json!(3.5));
        assert_eq!(adapt(&SqlValue::Text("abc".into())), json!("abc"));
        assert_eq!(adapt(&SqlValue::Null), JsonValue::Null);
    }

    #[test]
    fn bool_becomes_integer() {
        assert_eq!(adapt(&SqlValue::Bool(true)), json!(1));
        assert_eq!(adapt(&SqlValue::Bool(false)), json!(0));
    }

    #[test]
    fn date_and_timestamp_use_iso_strings() {
        let date = NaiveDate::from_ymd_opt(2004, 2, 14).expect("date");
        assert_eq!(adapt(&SqlValue::Date(date)), json!("2004-02-14"));

        let ts = date.and_hms_opt(7, 15, 0).expect("time");
        assert_eq!(adapt(&SqlValue::Timestamp(ts)), json!("2004-02-14 07:15:00"));

        let ts_micro = NaiveDateTime::parse_from_str(
            "2004-02-14 07:15:00.000424",
            "%Y-%m-%d %H:%M:%S%.f",
        )
        .expect("parse");
        assert_eq!(
            adapt(&SqlValue::Timestamp(ts_micro)),
            json!("2004-02-14 07:15:00.000424")
        );
    }

    #[test]
    fn blob_becomes_byte_array() {
        assert_eq!(
            adapt(&SqlValue::Blob(vec![0x99, 0x47, 0x75])),
            json!([153, 71, 117])
        );
    }

    #[test]
    fn custom_values_describe_themselves() {
        #[derive(Debug)]
        struct Point {
            x: f64,
            y: f64,
        }

        impl ToWireValue for Point {
            fn to_wire_value(&self) -> Option<JsonValue> {
                Some(JsonValue::String(format!("{};{}", self.x, self.y)))
            }
        }

        let value = SqlValue::Custom(Arc::new(Point { x: 4.0, y: -3.2 }));
        assert_eq!(adapt(&value), json!("4;-3.2"));
    }

    #[test]
    fn unadaptable_custom_value_is_an_interface_error() {
        #[derive(Debug)]
        struct Opaque;

        impl ToWireValue for Opaque {
            fn to_wire_value(&self) -> Option<JsonValue> {
                None
            }
        }

        let err = adapt_value(
            &TypeRegistry::default(),
            &SqlValue::Custom(Arc::new(Opaque)),
        )
        .expect_err("should fail");
        assert!(matches!(err, RqliteDbError::InterfaceError(_)));
    }

    #[test]
    fn registered_adapter_overrides_builtin() {
        let mut registry = TypeRegistry::default();
        registry.register_adapter(ValueKind::Bool, |value| match value {
            SqlValue::Bool(b) => Ok(JsonValue::String(b.to_string())),
            other => Ok(JsonValue::String(format!("{other:?}"))),
        });
        let adapted = adapt_value(&registry, &SqlValue::Bool(true)).expect("adapt");
        assert_eq!(adapted, json!("true"));

        registry.deregister_adapter(ValueKind::Bool);
        let adapted = adapt_value(&registry, &SqlValue::Bool(true)).expect("adapt");
        assert_eq!(adapted, json!(1));
    }
}
