//! Storage: the adapter contract and the SQL backends.
//!
//! All adapters parameterize every value in generated SQL; identifiers come
//! only from the validated schema model. Nothing outside an adapter ever
//! branches on backend identity.

pub mod postgres;
pub mod sql;
pub mod sqlite;
pub mod value;

use crate::config::types::Collection;
use crate::db::sql::BoundClause;
use crate::db::value::{coerce_filter_value, sanitize, BindValue};
use crate::error::EngineError;
use crate::query::{ListQuery, Operator, PaginatedResult};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Query argument for `find_one`/`update`/`delete`: either a bare document
/// id or a field-equality map.
#[derive(Clone, Debug)]
pub enum Lookup {
    Id(i64),
    Fields(HashMap<String, Value>),
}

impl From<i64> for Lookup {
    fn from(id: i64) -> Self {
        Lookup::Id(id)
    }
}

impl From<HashMap<String, Value>> for Lookup {
    fn from(fields: HashMap<String, Value>) -> Self {
        Lookup::Fields(fields)
    }
}

/// The capability set every backend implements. One long-lived instance is
/// shared by all concurrent requests; each call owns its statement lifecycle
/// start-to-finish and no call holds a lock across I/O.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Establish backend connectivity. Calling again while connected is a
    /// no-op.
    async fn connect(&self) -> Result<(), EngineError>;

    /// Release backend resources. Safe on an already-disconnected adapter.
    async fn disconnect(&self) -> Result<(), EngineError>;

    /// Ensure a storage relation exists for every collection. Idempotent and
    /// additive-only: existing columns are never altered or dropped.
    async fn migrate(&self, collections: &[Collection]) -> Result<(), EngineError>;

    /// Insert one row; returns the full document including the assigned id.
    async fn create(
        &self,
        collection: &str,
        data: &HashMap<String, Value>,
    ) -> Result<Value, EngineError>;

    /// `create` for the account collection: the role column is assigned
    /// inside the insert statement — `admin` when the table is empty, the
    /// default role otherwise. Any caller-supplied role value is discarded.
    async fn create_account(
        &self,
        collection: &str,
        data: &HashMap<String, Value>,
        role_field: &str,
    ) -> Result<Value, EngineError>;

    /// Filtered, sorted, paginated listing. The count and page queries share
    /// one WHERE clause so they always agree.
    async fn find(&self, collection: &str, query: &ListQuery)
        -> Result<PaginatedResult, EngineError>;

    /// First match or `None`; never an error for "not found".
    async fn find_one(
        &self,
        collection: &str,
        lookup: &Lookup,
    ) -> Result<Option<Value>, EngineError>;

    /// Partial update: only supplied fields are set. Returns the post-update
    /// document, or `None` when nothing matched.
    async fn update(
        &self,
        collection: &str,
        lookup: &Lookup,
        data: &HashMap<String, Value>,
    ) -> Result<Option<Value>, EngineError>;

    /// True iff at least one row was removed.
    async fn delete(&self, collection: &str, lookup: &Lookup) -> Result<bool, EngineError>;

    async fn count(&self, collection: &str) -> Result<u64, EngineError>;

    /// Cheap liveness probe for readiness checks.
    async fn ping(&self) -> Result<(), EngineError>;
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Columns for an insert: declared fields present in `data`, in declared
/// order, plus engine timestamps.
pub(crate) fn insert_columns(
    collection: &Collection,
    data: &HashMap<String, Value>,
) -> Vec<(String, BindValue)> {
    let mut columns = Vec::new();
    for field in &collection.fields {
        if let Some(value) = data.get(&field.name) {
            columns.push((field.name.clone(), sanitize(value)));
        }
    }
    if collection.timestamps {
        let now = now_iso();
        columns.push(("createdAt".into(), BindValue::Text(now.clone())));
        columns.push(("updatedAt".into(), BindValue::Text(now)));
    }
    columns
}

/// SET columns for a partial update: declared fields present in `data`, plus
/// a refreshed `updatedAt`.
pub(crate) fn update_columns(
    collection: &Collection,
    data: &HashMap<String, Value>,
) -> Vec<(String, BindValue)> {
    let mut columns = Vec::new();
    for field in &collection.fields {
        if let Some(value) = data.get(&field.name) {
            columns.push((field.name.clone(), sanitize(value)));
        }
    }
    if !columns.is_empty() && collection.timestamps {
        columns.push(("updatedAt".into(), BindValue::Text(now_iso())));
    }
    columns
}

/// Equality clauses for a lookup. Unknown fields are rejected before any SQL
/// is built.
pub(crate) fn lookup_clauses(
    collection: &Collection,
    lookup: &Lookup,
) -> Result<Vec<BoundClause>, EngineError> {
    match lookup {
        Lookup::Id(id) => Ok(vec![("id".into(), Operator::Eq, BindValue::Int(*id))]),
        Lookup::Fields(fields) => {
            let mut entries: Vec<(&String, &Value)> = fields.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut clauses = Vec::with_capacity(entries.len());
            for (name, value) in entries {
                if !collection.is_queryable_column(name) {
                    return Err(EngineError::BadRequest(format!(
                        "unknown field in query: {name}"
                    )));
                }
                clauses.push((name.clone(), Operator::Eq, sanitize(value)));
            }
            Ok(clauses)
        }
    }
}

/// Typed clauses for a list query. Unknown filter or sort fields are
/// rejected with a client error rather than passed into SQL.
pub(crate) fn filter_clauses(
    collection: &Collection,
    query: &ListQuery,
) -> Result<Vec<BoundClause>, EngineError> {
    if !collection.is_queryable_column(&query.sort.field) {
        return Err(EngineError::BadRequest(format!(
            "unknown sort field: {}",
            query.sort.field
        )));
    }
    let mut clauses = Vec::with_capacity(query.filter.len());
    for clause in &query.filter {
        if !collection.is_queryable_column(&clause.field) {
            return Err(EngineError::BadRequest(format!(
                "unknown field in filter: {}",
                clause.field
            )));
        }
        clauses.push((
            clause.field.clone(),
            clause.op,
            coerce_filter_value(collection, &clause.field, &clause.value),
        ));
    }
    Ok(clauses)
}
