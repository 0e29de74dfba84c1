//! Wire bodies shared by handlers and the error mapper.

use crate::validation::FieldError;
use serde::Serialize;
use serde_json::{json, Value};

/// `{"message": "..."}`
pub fn message_body(message: impl Into<String>) -> Value {
    json!({ "message": message.into() })
}

/// `{"message": "Validation Error", "errors": [...]}` with one entry per
/// failed field.
pub fn validation_body(errors: Vec<FieldError>) -> Value {
    json!({ "message": "Validation Error", "errors": errors })
}

/// Success acknowledgement for deletes.
#[derive(Serialize)]
pub struct Acknowledge {
    pub success: bool,
}

impl Acknowledge {
    pub fn ok() -> Self {
        Acknowledge { success: true }
    }
}
