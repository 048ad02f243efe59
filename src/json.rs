//! JSON value binding.
//!
//! Filter and create/update data usually originates in a transport layer as
//! JSON. [`value_map_from_json`] converts a JSON object into a typed
//! [`ValueMap`] using the model's schema, so repositories receive properly
//! typed values and malformed input fails as a `DataValidation` error before
//! anything reaches a session.

use chrono::{DateTime, Utc};
use sea_query::Value;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::record::ValueMap;
use crate::schema::{FieldType, SchemaDescriptor};

/// Convert a JSON object into a typed value map for `schema`.
///
/// Strings feed text fields directly and are parsed for UUID and RFC 3339
/// timestamp fields; JSON numbers and booleans map to their column types;
/// `null` maps to the field's typed null. Embedded objects/arrays are only
/// valid for JSON fields.
///
/// # Errors
///
/// - `Usage` when `json` is not an object.
/// - `DataValidation` when a key is not a field of the model or its value
///   cannot be converted to the field's type.
///
/// # Example
///
/// ```
/// use once_cell::sync::Lazy;
/// use quaymaster::json::value_map_from_json;
/// use quaymaster::schema::{FieldDef, FieldType, SchemaDescriptor};
/// use serde_json::json;
///
/// static SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
///     SchemaDescriptor::builder("User", "users")
///         .field(FieldDef::new("id", FieldType::Integer).primary_key())
///         .field(FieldDef::new("name", FieldType::Text))
///         .build()
/// });
///
/// let values = value_map_from_json(&SCHEMA, &json!({"name": "amy"}))?;
/// assert_eq!(values.get("name"), Some(&sea_query::Value::from("amy")));
/// # Ok::<(), quaymaster::RepositoryError>(())
/// ```
pub fn value_map_from_json(
    schema: &SchemaDescriptor,
    json: &serde_json::Value,
) -> Result<ValueMap, RepositoryError> {
    let object = json.as_object().ok_or_else(|| RepositoryError::Usage {
        details: format!(
            "expected a JSON object for model '{}', got {}",
            schema.model(),
            json_kind(json)
        ),
    })?;

    let mut values = ValueMap::new();
    for (key, raw) in object {
        let field = schema
            .resolve_field(key)
            .ok_or_else(|| data_error(schema, key, String::new()))?;
        let value = convert(field.field_type(), raw)
            .map_err(|original| data_error(schema, key, original))?;
        values.insert(key.clone(), value);
    }
    Ok(values)
}

fn data_error(schema: &SchemaDescriptor, key: &str, original: String) -> RepositoryError {
    RepositoryError::DataValidation {
        details: format!("'{}' for model '{}'", key, schema.model()),
        original,
    }
}

fn convert(field_type: FieldType, raw: &serde_json::Value) -> Result<Value, String> {
    use serde_json::Value as Json;

    if raw.is_null() {
        return Ok(typed_null(field_type));
    }
    match (field_type, raw) {
        (FieldType::Bool, Json::Bool(b)) => Ok(Value::from(*b)),
        (FieldType::Integer, Json::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::from)
            .ok_or_else(|| format!("{n} is not a 32-bit integer")),
        (FieldType::BigInteger, Json::Number(n)) => n
            .as_i64()
            .map(Value::from)
            .ok_or_else(|| format!("{n} is not a 64-bit integer")),
        (FieldType::Float, Json::Number(n)) => n
            .as_f64()
            .map(|v| Value::from(v as f32))
            .ok_or_else(|| format!("{n} is not a float")),
        (FieldType::Double, Json::Number(n)) => n
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| format!("{n} is not a double")),
        (FieldType::Text, Json::String(s)) => Ok(Value::from(s.as_str())),
        (FieldType::Uuid, Json::String(s)) => Uuid::parse_str(s)
            .map(Value::from)
            .map_err(|e| format!("invalid uuid: {e}")),
        (FieldType::DateTimeUtc, Json::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Value::from(dt.with_timezone(&Utc)))
            .map_err(|e| format!("invalid RFC 3339 timestamp: {e}")),
        (FieldType::Json, raw) => Ok(Value::Json(Some(Box::new(raw.clone())))),
        (expected, raw) => Err(format!(
            "expected {} value, got JSON {}",
            expected.name(),
            json_kind(raw)
        )),
    }
}

fn typed_null(field_type: FieldType) -> Value {
    match field_type {
        FieldType::Bool => Value::Bool(None),
        FieldType::Integer => Value::Int(None),
        FieldType::BigInteger => Value::BigInt(None),
        FieldType::Float => Value::Float(None),
        FieldType::Double => Value::Double(None),
        FieldType::Text => Value::String(None),
        FieldType::Uuid => Value::Uuid(None),
        FieldType::DateTimeUtc => Value::ChronoDateTimeUtc(None),
        FieldType::Json => Value::Json(None),
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
