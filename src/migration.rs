//! Derives column definitions from a collection declaration.
//!
//! Pure: no SQL text here. Dialect rendering lives in `db::sql`. The derived
//! shape is additive-only — adapters emit `CREATE TABLE IF NOT EXISTS` and
//! never alter or drop existing columns.

use crate::config::types::{Collection, FieldType};
use serde_json::Value;

/// Logical column type; each dialect renders its own spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnRole {
    PrimaryKey,
    Field,
    Timestamp,
}

#[derive(Clone, Debug)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub role: ColumnRole,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<Value>,
}

/// Storage type for a field: numbers are floating, booleans are 0/1
/// integers, everything else is text-like.
pub fn column_type_for(field_type: FieldType) -> ColumnType {
    match field_type {
        FieldType::Number => ColumnType::Real,
        FieldType::Boolean => ColumnType::Integer,
        FieldType::Text
        | FieldType::Richtext
        | FieldType::Relationship
        | FieldType::Select
        | FieldType::Date
        | FieldType::Array => ColumnType::Text,
    }
}

/// Column list for a collection: `id` primary key first, declared fields in
/// order, timestamp columns last.
pub fn columns_for(collection: &Collection) -> Vec<ColumnDef> {
    let mut columns = Vec::with_capacity(collection.fields.len() + 3);
    columns.push(ColumnDef {
        name: "id".into(),
        column_type: ColumnType::Integer,
        role: ColumnRole::PrimaryKey,
        not_null: false,
        unique: false,
        default: None,
    });
    for field in &collection.fields {
        columns.push(ColumnDef {
            name: field.name.clone(),
            column_type: column_type_for(field.field_type),
            role: ColumnRole::Field,
            not_null: field.required,
            unique: field.unique,
            default: field.default_value.clone(),
        });
    }
    if collection.timestamps {
        for name in ["createdAt", "updatedAt"] {
            columns.push(ColumnDef {
                name: name.into(),
                column_type: ColumnType::Text,
                role: ColumnRole::Timestamp,
                not_null: false,
                unique: false,
                default: None,
            });
        }
    }
    columns
}
