//! Typed errors and HTTP mapping.

use crate::hooks::HookError;
use crate::response::{message_body, validation_body};
use crate::validation::FieldError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Configuration-time failures. All of these abort startup; none can occur
/// once the engine is serving traffic.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid identifier: {kind} '{name}'")]
    InvalidIdentifier { kind: &'static str, name: String },
    #[error("duplicate {kind}: '{name}'")]
    Duplicate { kind: &'static str, name: String },
    #[error("reserved name: '{name}' ({reason})")]
    Reserved { name: String, reason: &'static str },
    #[error("default value for '{slug}.{field}' does not match the declared field type")]
    DefaultTypeMismatch { slug: String, field: String },
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("role '{role}' grants unknown resource '{resource}'")]
    UnknownResource { role: String, resource: String },
    #[error("role '{role}' grants unknown action '{action}' on resource '{resource}'")]
    UnknownAction {
        role: String,
        resource: String,
        action: String,
    },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("connection: {0}")]
    Connection(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("hook: {0}")]
    Hook(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<HookError> for EngineError {
    fn from(e: HookError) -> Self {
        EngineError::Hook(e.to_string())
    }
}

/// Surface constraint breakage (unique, NOT NULL, foreign key, check) as its
/// own class; everything else stays a database error.
pub(crate) fn map_db_err(e: sqlx::Error) -> EngineError {
    if let sqlx::Error::Database(ref db) = e {
        use sqlx::error::ErrorKind;
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::CheckViolation => {
                return EngineError::Constraint(db.message().to_string());
            }
            _ => {}
        }
    }
    EngineError::Db(e)
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            EngineError::NotFound => (StatusCode::NOT_FOUND, message_body("Not found")),
            EngineError::Validation(errors) => (StatusCode::BAD_REQUEST, validation_body(errors)),
            EngineError::Unauthorized => (StatusCode::UNAUTHORIZED, message_body("Unauthorized")),
            EngineError::Forbidden => (StatusCode::FORBIDDEN, message_body("Forbidden")),
            EngineError::Constraint(msg) => (StatusCode::CONFLICT, message_body(msg)),
            EngineError::BadRequest(msg) => (StatusCode::BAD_REQUEST, message_body(msg)),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_body("Internal Server Error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
