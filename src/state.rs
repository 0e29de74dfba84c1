//! Shared application state for all routes. Read-only after startup.

use crate::access::{AccessStatement, RoleSet};
use crate::auth::SessionProvider;
use crate::config::resolved::SchemaModel;
use crate::config::types::{AdminConfig, EngineConfig};
use crate::db::StorageAdapter;
use crate::error::ConfigError;
use std::sync::Arc;

/// Engine settings that survive past configuration: admin options and the
/// public server URL (surfaced by `__admin/config`).
#[derive(Clone, Debug)]
pub struct Settings {
    pub admin: AdminConfig,
    pub server_url: Option<String>,
}

impl Settings {
    pub fn is_user_collection(&self, slug: &str) -> bool {
        self.admin.user_collection.as_deref() == Some(slug)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn StorageAdapter>,
    pub schema: Arc<SchemaModel>,
    pub roles: Arc<RoleSet>,
    pub settings: Arc<Settings>,
    pub sessions: Option<Arc<dyn SessionProvider>>,
}

impl AppState {
    /// Compile the runtime state from a validated schema model and an
    /// adapter. Custom roles are validated here; unknown grants fail fast.
    pub fn new(
        config: &EngineConfig,
        schema: Arc<SchemaModel>,
        db: Arc<dyn StorageAdapter>,
        sessions: Option<Arc<dyn SessionProvider>>,
    ) -> Result<Self, ConfigError> {
        let statement = AccessStatement::synthesize(schema.collections());
        let roles = RoleSet::compile(&statement, &config.roles)?;
        Ok(AppState {
            db,
            schema,
            roles: Arc::new(roles),
            settings: Arc::new(Settings {
                admin: config.admin.clone(),
                server_url: config.server_url.clone(),
            }),
            sessions,
        })
    }
}
