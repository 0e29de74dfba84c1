//! Embedded single-file adapter over SQLite.
//!
//! The backend is a single connection; concurrent requests share it and
//! statements serialize at the pool. No cross-statement transactional
//! isolation is promised (a list's count and page queries can interleave
//! with a concurrent write).

use crate::config::resolved::SchemaModel;
use crate::config::types::Collection;
use crate::db::sql::{self, Dialect};
use crate::db::value::{document_from_row, RowAccess};
use crate::db::{
    filter_clauses, insert_columns, lookup_clauses, update_columns, Lookup, StorageAdapter,
};
use crate::error::{map_db_err, EngineError};
use crate::query::{ListQuery, PaginatedResult};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub struct SqliteAdapter {
    path: String,
    schema: Arc<SchemaModel>,
    pool: RwLock<Option<SqlitePool>>,
}

impl SqliteAdapter {
    /// `path` is a filesystem path; `:memory:` opens a private in-memory
    /// database (used by the test suites).
    pub fn new(path: impl Into<String>, schema: Arc<SchemaModel>) -> Self {
        SqliteAdapter {
            path: path.into(),
            schema,
            pool: RwLock::new(None),
        }
    }

    fn pool(&self) -> Result<SqlitePool, EngineError> {
        self.pool
            .read()
            .map_err(|_| EngineError::Connection("adapter lock poisoned".into()))?
            .clone()
            .ok_or_else(|| EngineError::Connection("sqlite adapter is not connected".into()))
    }

    fn collection(&self, slug: &str) -> Result<&Collection, EngineError> {
        self.schema.collection(slug).ok_or(EngineError::NotFound)
    }

    async fn fetch_docs(
        &self,
        collection: &Collection,
        q: sql::QueryBuf,
    ) -> Result<Vec<Value>, EngineError> {
        let pool = self.pool()?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = query.bind(p);
        }
        let rows = query.fetch_all(&pool).await.map_err(map_db_err)?;
        Ok(rows
            .iter()
            .map(|row| document_from_row(collection, row))
            .collect())
    }

    async fn fetch_doc(
        &self,
        collection: &Collection,
        q: sql::QueryBuf,
    ) -> Result<Option<Value>, EngineError> {
        let pool = self.pool()?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = query.bind(p);
        }
        let row = query.fetch_optional(&pool).await.map_err(map_db_err)?;
        Ok(row.map(|row| document_from_row(collection, &row)))
    }

    async fn fetch_count(&self, q: sql::QueryBuf) -> Result<u64, EngineError> {
        let pool = self.pool()?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in q.params {
            query = query.bind(p);
        }
        let n = query.fetch_one(&pool).await.map_err(map_db_err)?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl StorageAdapter for SqliteAdapter {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn connect(&self) -> Result<(), EngineError> {
        {
            let guard = self
                .pool
                .read()
                .map_err(|_| EngineError::Connection("adapter lock poisoned".into()))?;
            if guard.is_some() {
                return Ok(());
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);
        // Single backend connection: statements serialize at the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        let redundant = {
            let mut guard = self
                .pool
                .write()
                .map_err(|_| EngineError::Connection("adapter lock poisoned".into()))?;
            if guard.is_none() {
                *guard = Some(pool);
                None
            } else {
                Some(pool)
            }
        };
        if let Some(pool) = redundant {
            pool.close().await;
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), EngineError> {
        let pool = {
            let mut guard = self
                .pool
                .write()
                .map_err(|_| EngineError::Connection("adapter lock poisoned".into()))?;
            guard.take()
        };
        if let Some(pool) = pool {
            pool.close().await;
        }
        Ok(())
    }

    async fn migrate(&self, collections: &[Collection]) -> Result<(), EngineError> {
        let pool = self.pool()?;
        for collection in collections {
            let ddl = sql::create_table(Dialect::Sqlite, collection);
            tracing::info!(collection = %collection.slug, "migrate");
            tracing::debug!(sql = %ddl, "ddl");
            sqlx::query(&ddl).execute(&pool).await.map_err(map_db_err)?;
        }
        Ok(())
    }

    async fn create(
        &self,
        collection: &str,
        data: &HashMap<String, Value>,
    ) -> Result<Value, EngineError> {
        let collection = self.collection(collection)?;
        let columns = insert_columns(collection, data);
        let q = sql::insert(Dialect::Sqlite, &collection.slug, &columns);
        self.fetch_doc(collection, q)
            .await?
            .ok_or(EngineError::Db(sqlx::Error::RowNotFound))
    }

    async fn create_account(
        &self,
        collection: &str,
        data: &HashMap<String, Value>,
        role_field: &str,
    ) -> Result<Value, EngineError> {
        let collection = self.collection(collection)?;
        let mut data = data.clone();
        data.remove(role_field);
        let columns = insert_columns(collection, &data);
        let q = sql::insert_account(
            Dialect::Sqlite,
            &collection.slug,
            &columns,
            role_field,
            crate::access::ADMIN_ROLE,
            crate::access::DEFAULT_ROLE,
        );
        self.fetch_doc(collection, q)
            .await?
            .ok_or(EngineError::Db(sqlx::Error::RowNotFound))
    }

    async fn find(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<PaginatedResult, EngineError> {
        let collection = self.collection(collection)?;
        let clauses = filter_clauses(collection, query)?;
        let total = self
            .fetch_count(sql::select_count(Dialect::Sqlite, &collection.slug, &clauses))
            .await?;
        let docs = self
            .fetch_docs(
                collection,
                sql::select_page(
                    Dialect::Sqlite,
                    &collection.slug,
                    &clauses,
                    &query.sort,
                    query.limit,
                    query.offset(),
                ),
            )
            .await?;
        Ok(PaginatedResult::assemble(
            docs,
            total,
            query.page,
            query.limit,
        ))
    }

    async fn find_one(
        &self,
        collection: &str,
        lookup: &Lookup,
    ) -> Result<Option<Value>, EngineError> {
        let collection = self.collection(collection)?;
        let clauses = lookup_clauses(collection, lookup)?;
        let q = sql::select_one(Dialect::Sqlite, &collection.slug, &clauses);
        self.fetch_doc(collection, q).await
    }

    async fn update(
        &self,
        collection: &str,
        lookup: &Lookup,
        data: &HashMap<String, Value>,
    ) -> Result<Option<Value>, EngineError> {
        let collection = self.collection(collection)?;
        let sets = update_columns(collection, data);
        let clauses = lookup_clauses(collection, lookup)?;
        if sets.is_empty() {
            // Nothing to set; an empty patch reads back the current row.
            let q = sql::select_one(Dialect::Sqlite, &collection.slug, &clauses);
            return self.fetch_doc(collection, q).await;
        }
        let q = sql::update(Dialect::Sqlite, &collection.slug, &sets, &clauses);
        self.fetch_doc(collection, q).await
    }

    async fn delete(&self, collection: &str, lookup: &Lookup) -> Result<bool, EngineError> {
        let collection = self.collection(collection)?;
        let clauses = lookup_clauses(collection, lookup)?;
        let q = sql::delete(Dialect::Sqlite, &collection.slug, &clauses);
        let pool = self.pool()?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = query.bind(p);
        }
        let result = query.execute(&pool).await.map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: &str) -> Result<u64, EngineError> {
        let collection = self.collection(collection)?;
        self.fetch_count(sql::select_count(Dialect::Sqlite, &collection.slug, &[]))
            .await
    }

    async fn ping(&self) -> Result<(), EngineError> {
        let pool = self.pool()?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(())
    }
}

impl RowAccess for SqliteRow {
    fn get_i64(&self, column: &str) -> Option<i64> {
        self.try_get::<Option<i64>, _>(column).ok().flatten()
    }

    fn get_f64(&self, column: &str) -> Option<f64> {
        self.try_get::<Option<f64>, _>(column)
            .ok()
            .flatten()
            .or_else(|| self.get_i64(column).map(|n| n as f64))
    }

    fn get_text(&self, column: &str) -> Option<String> {
        self.try_get::<Option<String>, _>(column).ok().flatten()
    }
}
