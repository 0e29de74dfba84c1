//! Dialect-aware SQL text: identifiers come from the validated schema only,
//! values are always bound parameters.

use crate::config::types::Collection;
use crate::db::value::BindValue;
use crate::migration::{self, ColumnRole, ColumnType};
use crate::query::{Operator, Sort};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Sqlite => "?".into(),
            Dialect::Postgres => format!("${n}"),
        }
    }

    fn auto_primary_key(self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }

    fn column_type(self, column_type: ColumnType) -> &'static str {
        match (self, column_type) {
            (_, ColumnType::Integer) => "INTEGER",
            (Dialect::Sqlite, ColumnType::Real) => "REAL",
            (Dialect::Postgres, ColumnType::Real) => "DOUBLE PRECISION",
            (_, ColumnType::Text) => "TEXT",
        }
    }

    /// Timestamp columns are TEXT; the default only covers rows written
    /// outside the engine (the adapters set both columns explicitly).
    fn timestamp_default(self) -> &'static str {
        match self {
            Dialect::Sqlite => "CURRENT_TIMESTAMP",
            Dialect::Postgres => "now()::text",
        }
    }
}

/// Quote an identifier. Identifiers only ever come from the schema model,
/// which has already rejected anything unsafe.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, dialect: Dialect, value: BindValue) -> String {
        self.params.push(value);
        dialect.placeholder(self.params.len())
    }
}

/// A filter clause whose field has been validated against the schema and
/// whose value has been coerced for the column.
pub type BoundClause = (String, Operator, BindValue);

fn where_clause(q: &mut QueryBuf, dialect: Dialect, clauses: &[BoundClause]) -> String {
    if clauses.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = clauses
        .iter()
        .map(|(field, op, value)| {
            let ph = q.push_param(dialect, value.clone());
            format!("{} {} {}", quoted(field), op.sql(), ph)
        })
        .collect();
    format!(" WHERE {}", parts.join(" AND "))
}

/// `CREATE TABLE IF NOT EXISTS` from the derived column list. Additive-only;
/// an existing table is left untouched.
pub fn create_table(dialect: Dialect, collection: &Collection) -> String {
    let defs: Vec<String> = migration::columns_for(collection)
        .iter()
        .map(|col| match col.role {
            ColumnRole::PrimaryKey => format!("{} {}", quoted(&col.name), dialect.auto_primary_key()),
            ColumnRole::Timestamp => format!(
                "{} TEXT DEFAULT {}",
                quoted(&col.name),
                dialect.timestamp_default()
            ),
            ColumnRole::Field => {
                let mut def = format!(
                    "{} {}",
                    quoted(&col.name),
                    dialect.column_type(col.column_type)
                );
                if col.not_null {
                    def.push_str(" NOT NULL");
                }
                if col.unique {
                    def.push_str(" UNIQUE");
                }
                if let Some(default) = &col.default {
                    def.push_str(" DEFAULT ");
                    def.push_str(&default_literal(default));
                }
                def
            }
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(&collection.slug),
        defs.join(", ")
    )
}

/// Render a declared default as a SQL literal, through the same sanitization
/// rules as bound values.
fn default_literal(value: &Value) -> String {
    match value {
        Value::Bool(true) => "1".into(),
        Value::Bool(false) => "0".into(),
        Value::Number(n) => n.to_string(),
        Value::Null => "NULL".into(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

pub fn select_count(dialect: Dialect, table: &str, clauses: &[BoundClause]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, dialect, clauses);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(table), where_sql);
    q
}

pub fn select_page(
    dialect: Dialect,
    table: &str,
    clauses: &[BoundClause],
    sort: &Sort,
    limit: u32,
    offset: u32,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, dialect, clauses);
    let direction = if sort.descending { "DESC" } else { "ASC" };
    q.sql = format!(
        "SELECT * FROM {}{} ORDER BY {} {} LIMIT {} OFFSET {}",
        quoted(table),
        where_sql,
        quoted(&sort.field),
        direction,
        limit,
        offset
    );
    q
}

pub fn select_one(dialect: Dialect, table: &str, clauses: &[BoundClause]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, dialect, clauses);
    q.sql = format!("SELECT * FROM {}{} LIMIT 1", quoted(table), where_sql);
    q
}

pub fn insert(dialect: Dialect, table: &str, columns: &[(String, BindValue)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    if columns.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING *", quoted(table));
        return q;
    }
    let mut names = Vec::with_capacity(columns.len());
    let mut placeholders = Vec::with_capacity(columns.len());
    for (name, value) in columns {
        names.push(quoted(name));
        placeholders.push(q.push_param(dialect, value.clone()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        quoted(table),
        names.join(", "),
        placeholders.join(", ")
    );
    q
}

/// Account insert with the first-admin bootstrap: the role column is decided
/// inside the statement, so two concurrent signups cannot both observe an
/// empty table and both win the promotion.
pub fn insert_account(
    dialect: Dialect,
    table: &str,
    columns: &[(String, BindValue)],
    role_field: &str,
    first_role: &str,
    default_role: &str,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut names = Vec::with_capacity(columns.len() + 1);
    let mut exprs = Vec::with_capacity(columns.len() + 1);
    for (name, value) in columns {
        names.push(quoted(name));
        exprs.push(q.push_param(dialect, value.clone()));
    }
    let first = q.push_param(dialect, BindValue::Text(first_role.into()));
    let fallback = q.push_param(dialect, BindValue::Text(default_role.into()));
    names.push(quoted(role_field));
    exprs.push(format!(
        "CASE WHEN (SELECT COUNT(*) FROM {}) = 0 THEN {} ELSE {} END",
        quoted(table),
        first,
        fallback
    ));
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        quoted(table),
        names.join(", "),
        exprs.join(", ")
    );
    q
}

pub fn update(
    dialect: Dialect,
    table: &str,
    sets: &[(String, BindValue)],
    clauses: &[BoundClause],
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let set_parts: Vec<String> = sets
        .iter()
        .map(|(name, value)| {
            let ph = q.push_param(dialect, value.clone());
            format!("{} = {}", quoted(name), ph)
        })
        .collect();
    let where_sql = where_clause(&mut q, dialect, clauses);
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING *",
        quoted(table),
        set_parts.join(", "),
        where_sql
    );
    q
}

pub fn delete(dialect: Dialect, table: &str, clauses: &[BoundClause]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, dialect, clauses);
    q.sql = format!("DELETE FROM {}{}", quoted(table), where_sql);
    q
}
