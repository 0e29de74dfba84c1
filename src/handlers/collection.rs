//! Collection CRUD handlers: list, read, create, update, delete.
//!
//! The collection is resolved from the path slug on every request; SQL and
//! validation are built from the shared schema model, never cached copies.

use crate::access::ROLE_FIELD;
use crate::db::Lookup;
use crate::error::EngineError;
use crate::query::{ListQuery, PaginatedResult};
use crate::response::Acknowledge;
use crate::state::AppState;
use crate::validation::{document_schema, ValidationMode};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Non-numeric ids match no document.
fn parse_id(raw: &str) -> Result<i64, EngineError> {
    raw.parse().map_err(|_| EngineError::NotFound)
}

pub async fn list(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedResult>, EngineError> {
    let collection = state.schema.collection(&slug).ok_or(EngineError::NotFound)?;
    let query = ListQuery::from_params(&params);
    let result = state.db.find(&collection.slug, &query).await?;
    Ok(Json(result))
}

pub async fn read(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Value>, EngineError> {
    let collection = state.schema.collection(&slug).ok_or(EngineError::NotFound)?;
    let id = parse_id(&id)?;
    let doc = state
        .db
        .find_one(&collection.slug, &Lookup::Id(id))
        .await?
        .ok_or(EngineError::NotFound)?;
    Ok(Json(doc))
}

pub async fn create(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), EngineError> {
    let collection = state.schema.collection(&slug).ok_or(EngineError::NotFound)?;
    let mut data = document_schema(collection, ValidationMode::Create).validate(&body)?;

    if let Some(hooks) = &collection.hooks {
        data = hooks.before_create(data).await?;
    }

    let doc = if state.settings.is_user_collection(&collection.slug) {
        state
            .db
            .create_account(&collection.slug, &data, ROLE_FIELD)
            .await?
    } else {
        state.db.create(&collection.slug, &data).await?
    };

    if let Some(hooks) = &collection.hooks {
        if let Err(err) = hooks.after_create(&doc).await {
            tracing::error!(collection = %collection.slug, error = %err, "afterCreate hook failed; document is already persisted");
        }
    }

    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn update(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, EngineError> {
    let collection = state.schema.collection(&slug).ok_or(EngineError::NotFound)?;
    let id = parse_id(&id)?;
    let mut data = document_schema(collection, ValidationMode::Update).validate(&body)?;

    if let Some(hooks) = &collection.hooks {
        data = hooks.before_update(data).await?;
    }

    let doc = state
        .db
        .update(&collection.slug, &Lookup::Id(id), &data)
        .await?
        .ok_or(EngineError::NotFound)?;

    if let Some(hooks) = &collection.hooks {
        if let Err(err) = hooks.after_update(&doc).await {
            tracing::error!(collection = %collection.slug, error = %err, "afterUpdate hook failed; document is already persisted");
        }
    }

    Ok(Json(doc))
}

/// Acknowledges success whether or not a row existed; hooks fire without an
/// existence check.
pub async fn delete(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Acknowledge>, EngineError> {
    let collection = state.schema.collection(&slug).ok_or(EngineError::NotFound)?;
    let id = parse_id(&id)?;

    if let Some(hooks) = &collection.hooks {
        hooks.before_delete(id).await?;
    }

    state.db.delete(&collection.slug, &Lookup::Id(id)).await?;

    if let Some(hooks) = &collection.hooks {
        if let Err(err) = hooks.after_delete(id).await {
            tracing::error!(collection = %collection.slug, error = %err, "afterDelete hook failed; row is already gone");
        }
    }

    Ok(Json(Acknowledge::ok()))
}
