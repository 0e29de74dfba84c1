//! Request-body validation derived from a collection's field schema.
//!
//! The create schema enforces `required` and applies declared defaults; the
//! update schema makes every field optional. Unknown body keys are stripped
//! so nothing outside the declaration ever reaches an adapter.

use crate::config::types::{Collection, Field, FieldType};
use crate::error::EngineError;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

#[derive(Clone, Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub struct DocumentSchema<'a> {
    collection: &'a Collection,
    mode: ValidationMode,
}

/// Derive the request schema for a collection in the given mode.
pub fn document_schema(collection: &Collection, mode: ValidationMode) -> DocumentSchema<'_> {
    DocumentSchema { collection, mode }
}

impl DocumentSchema<'_> {
    /// Check `body` against the collection's fields. Returns the accepted
    /// data, or every field error at once.
    pub fn validate(&self, body: &Value) -> Result<HashMap<String, Value>, EngineError> {
        let Value::Object(map) = body else {
            return Err(EngineError::BadRequest("body must be a JSON object".into()));
        };

        let mut data = HashMap::new();
        let mut errors = Vec::new();

        for field in &self.collection.fields {
            let value = map.get(&field.name).filter(|v| !v.is_null());
            match value {
                Some(v) => match check_type(field, v) {
                    Ok(()) => {
                        data.insert(field.name.clone(), v.clone());
                    }
                    Err(message) => errors.push(FieldError {
                        field: field.name.clone(),
                        message,
                    }),
                },
                None => {
                    if self.mode == ValidationMode::Create {
                        if let Some(default) = &field.default_value {
                            data.insert(field.name.clone(), default.clone());
                        } else if field.required {
                            errors.push(FieldError {
                                field: field.name.clone(),
                                message: "is required".into(),
                            });
                        }
                    } else if map.contains_key(&field.name) {
                        // Explicit null clears an optional field on update.
                        if field.required {
                            errors.push(FieldError {
                                field: field.name.clone(),
                                message: "is required".into(),
                            });
                        } else {
                            data.insert(field.name.clone(), Value::Null);
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(EngineError::Validation(errors))
        }
    }
}

fn check_type(field: &Field, value: &Value) -> Result<(), String> {
    let ok = match field.field_type {
        FieldType::Text | FieldType::Richtext | FieldType::Select => value.is_string(),
        FieldType::Relationship => value.is_string() || value.as_i64().is_some(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array => value.is_array(),
        FieldType::Date => value.as_str().is_some_and(is_valid_date),
    };
    if ok {
        Ok(())
    } else {
        Err(match field.field_type {
            FieldType::Text | FieldType::Richtext | FieldType::Select => {
                "must be a string".into()
            }
            FieldType::Relationship => "must be a document id".into(),
            FieldType::Number => "must be a number".into(),
            FieldType::Boolean => "must be a boolean".into(),
            FieldType::Array => "must be an array".into(),
            FieldType::Date => "must be an ISO-8601 date".into(),
        })
    }
}

fn is_valid_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
