//! Quarry: configuration-driven content engine.
//!
//! A host declares named collections (typed field schemas) once; the engine
//! derives the persisted storage schema, a REST CRUD surface with
//! filtering/sorting/pagination, and a role-based access-control statement
//! from that single declaration — no per-collection database or routing
//! code.

pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod migration;
pub mod query;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

pub use access::{AccessStatement, Role, RoleSet};
pub use auth::{Session, SessionProvider, SessionUser};
pub use config::{
    AccessPredicates, AdminConfig, Collection, EngineConfig, Field, FieldType, Global, RoleGrants,
    SchemaModel,
};
pub use db::{postgres::PostgresAdapter, sqlite::SqliteAdapter, Lookup, StorageAdapter};
pub use error::{ConfigError, EngineError};
pub use hooks::{CollectionHooks, HookError};
pub use query::{ListQuery, PaginatedResult};
pub use routes::{admin_routes, api_router, collection_routes, common_routes};
pub use state::{AppState, Settings};
pub use validation::{document_schema, FieldError, ValidationMode};
