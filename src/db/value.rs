//! Uniform value handling across backends: sanitize JSON values into bind
//! parameters, coerce query-string filters per field type, and decode rows
//! back into documents.

use crate::config::types::{Collection, FieldType};
use serde_json::{Map, Value};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::Database;

/// A sanitized parameter, bindable on either backend.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

/// Sanitize one JSON value for storage: booleans become 0/1, nested
/// arrays/objects become serialized text, null stays NULL. Date values
/// arrive as ISO-8601 strings and pass through as text. Identical across
/// adapters so behavior is backend-independent.
pub fn sanitize(value: &Value) -> BindValue {
    match value {
        Value::Null => BindValue::Null,
        Value::Bool(b) => BindValue::Int(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(BindValue::Int)
            .or_else(|| n.as_f64().map(BindValue::Float))
            .unwrap_or(BindValue::Null),
        Value::String(s) => BindValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => BindValue::Text(value.to_string()),
    }
}

/// Coerce a raw query-string value for comparison against `field`'s column,
/// so numeric and boolean filters compare on typed values on both backends.
pub fn coerce_filter_value(collection: &Collection, field: &str, raw: &str) -> BindValue {
    if field == "id" {
        return raw
            .parse::<i64>()
            .map(BindValue::Int)
            .unwrap_or_else(|_| BindValue::Text(raw.into()));
    }
    match collection.field_named(field).map(|f| f.field_type) {
        Some(FieldType::Number) => raw
            .parse::<f64>()
            .map(BindValue::Float)
            .unwrap_or_else(|_| BindValue::Text(raw.into())),
        Some(FieldType::Boolean) => {
            if raw.eq_ignore_ascii_case("true") || raw == "1" {
                BindValue::Int(1)
            } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
                BindValue::Int(0)
            } else {
                BindValue::Text(raw.into())
            }
        }
        Some(FieldType::Relationship) => raw
            .parse::<i64>()
            .map(BindValue::Int)
            .unwrap_or_else(|_| BindValue::Text(raw.into())),
        _ => BindValue::Text(raw.into()),
    }
}

impl<'q> Encode<'q, Sqlite> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            BindValue::Null => <Option<i64> as Encode<Sqlite>>::encode_by_ref(&None, buf),
            BindValue::Int(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            BindValue::Float(n) => <f64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            BindValue::Text(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf),
        }
    }
}

impl sqlx::Type<Sqlite> for BindValue {
    fn type_info() -> SqliteTypeInfo {
        <str as sqlx::Type<Sqlite>>::type_info()
    }

    fn compatible(_ty: &SqliteTypeInfo) -> bool {
        true
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            BindValue::Null => <Option<String> as Encode<Postgres>>::encode_by_ref(&None, buf),
            BindValue::Int(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            BindValue::Float(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf),
            BindValue::Text(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)
            }
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            BindValue::Null | BindValue::Text(_) => <&str as sqlx::Type<Postgres>>::type_info(),
            BindValue::Int(_) => <i64 as sqlx::Type<Postgres>>::type_info(),
            BindValue::Float(_) => <f64 as sqlx::Type<Postgres>>::type_info(),
        })
    }
}

impl sqlx::Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<Postgres>>::type_info()
    }
}

/// Minimal row access for document decoding; implemented per backend row
/// type.
pub trait RowAccess {
    fn get_i64(&self, column: &str) -> Option<i64>;
    fn get_f64(&self, column: &str) -> Option<f64>;
    fn get_text(&self, column: &str) -> Option<String>;
}

/// Decode a storage row into a JSON document using the collection's field
/// types: booleans come back from their 0/1 storage, numbers as JSON
/// numbers, `array` fields from their serialized text.
pub fn document_from_row(collection: &Collection, row: &impl RowAccess) -> Value {
    let mut doc = Map::new();
    doc.insert(
        "id".into(),
        row.get_i64("id").map(Value::from).unwrap_or(Value::Null),
    );
    for field in &collection.fields {
        let value = match field.field_type {
            FieldType::Boolean => row.get_i64(&field.name).map(|n| Value::Bool(n != 0)),
            FieldType::Number => row
                .get_f64(&field.name)
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number)),
            FieldType::Array => row
                .get_text(&field.name)
                .map(|s| serde_json::from_str::<Value>(&s).unwrap_or_else(|_| Value::String(s))),
            _ => row.get_text(&field.name).map(Value::String),
        };
        doc.insert(field.name.clone(), value.unwrap_or(Value::Null));
    }
    if collection.timestamps {
        for column in ["createdAt", "updatedAt"] {
            doc.insert(
                column.into(),
                row.get_text(column).map(Value::String).unwrap_or(Value::Null),
            );
        }
    }
    Value::Object(doc)
}
