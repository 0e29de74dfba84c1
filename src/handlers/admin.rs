//! Admin introspection handlers.

use crate::error::EngineError;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn collections(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "collections": state.schema.collections(),
        "globals": state.schema.globals(),
    }))
}

pub async fn config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "serverURL": state.settings.server_url,
        "admin": state.settings.admin,
    }))
}

/// Unauthenticated: reports whether any account exists, so a fresh install
/// can route to first-user setup.
pub async fn setup(State(state): State<AppState>) -> Result<Json<Value>, EngineError> {
    let is_setup = match &state.settings.admin.user_collection {
        Some(slug) => state.db.count(slug).await? > 0,
        None => false,
    };
    Ok(Json(json!({ "isSetup": is_setup })))
}
