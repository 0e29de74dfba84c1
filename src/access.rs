//! Access-control statement synthesis and role compilation.
//!
//! Built once at configuration time from the collection list plus the system
//! resources, then shared read-only. Custom roles compile against the
//! synthesized statement and unknown grants are rejected, not dropped.

use crate::config::types::{Collection, RoleGrants};
use crate::error::ConfigError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const ADMIN_ROLE: &str = "admin";
pub const DEFAULT_ROLE: &str = "user";

/// Column on the user collection that the bootstrap promotion writes into.
pub const ROLE_FIELD: &str = "role";

pub const USER_RESOURCE: &str = "user";
pub const SESSION_RESOURCE: &str = "session";
pub const SYSTEM_RESOURCES: &[&str] = &[USER_RESOURCE, SESSION_RESOURCE];

const USER_ACTIONS: &[&str] = &["create", "read", "update", "delete", "ban", "impersonate"];
const SESSION_ACTIONS: &[&str] = &["read", "revoke", "delete"];
const CRUD_ACTIONS: &[&str] = &["create", "read", "update", "delete"];

fn action_set(actions: &[&str]) -> BTreeSet<String> {
    actions.iter().map(|a| (*a).to_string()).collect()
}

/// The permission grammar: every resource and the actions it admits.
#[derive(Clone, Debug, Serialize)]
pub struct AccessStatement {
    resources: BTreeMap<String, BTreeSet<String>>,
}

impl AccessStatement {
    /// Seed with the system resources, then one CRUD resource per collection.
    pub fn synthesize(collections: &[Collection]) -> Self {
        let mut resources = BTreeMap::new();
        resources.insert(USER_RESOURCE.to_string(), action_set(USER_ACTIONS));
        resources.insert(SESSION_RESOURCE.to_string(), action_set(SESSION_ACTIONS));
        for collection in collections {
            resources.insert(collection.slug.clone(), action_set(CRUD_ACTIONS));
        }
        AccessStatement { resources }
    }

    pub fn allows(&self, resource: &str, action: &str) -> bool {
        self.resources
            .get(resource)
            .is_some_and(|actions| actions.contains(action))
    }

    pub fn resources(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.resources
    }
}

/// A named grant subset of the statement.
#[derive(Clone, Debug, Serialize)]
pub struct Role {
    name: String,
    grants: BTreeMap<String, BTreeSet<String>>,
}

impl Role {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allows(&self, resource: &str, action: &str) -> bool {
        self.grants
            .get(resource)
            .is_some_and(|actions| actions.contains(action))
    }
}

/// All compiled roles: built-in `admin` (full statement) and `user` (empty
/// unless overridden), plus the custom roles from configuration.
#[derive(Clone, Debug, Serialize)]
pub struct RoleSet {
    roles: BTreeMap<String, Role>,
}

impl RoleSet {
    pub fn compile(
        statement: &AccessStatement,
        custom: &BTreeMap<String, RoleGrants>,
    ) -> Result<Self, ConfigError> {
        let mut roles = BTreeMap::new();
        roles.insert(
            ADMIN_ROLE.to_string(),
            Role {
                name: ADMIN_ROLE.to_string(),
                grants: statement.resources().clone(),
            },
        );
        roles.insert(
            DEFAULT_ROLE.to_string(),
            Role {
                name: DEFAULT_ROLE.to_string(),
                grants: BTreeMap::new(),
            },
        );

        for (name, grants) in custom {
            if name == ADMIN_ROLE {
                return Err(ConfigError::Validation(
                    "the built-in admin role cannot be redefined".into(),
                ));
            }
            let mut compiled = BTreeMap::new();
            for (resource, actions) in grants {
                let Some(allowed) = statement.resources().get(resource) else {
                    return Err(ConfigError::UnknownResource {
                        role: name.clone(),
                        resource: resource.clone(),
                    });
                };
                let mut set = BTreeSet::new();
                for action in actions {
                    if !allowed.contains(action) {
                        return Err(ConfigError::UnknownAction {
                            role: name.clone(),
                            resource: resource.clone(),
                            action: action.clone(),
                        });
                    }
                    set.insert(action.clone());
                }
                compiled.insert(resource.clone(), set);
            }
            roles.insert(
                name.clone(),
                Role {
                    name: name.clone(),
                    grants: compiled,
                },
            );
        }

        Ok(RoleSet { roles })
    }

    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// True when any role in `role_value` (a single name or comma-separated
    /// list) grants `action` on `resource`. `admin` grants everything.
    pub fn allows(&self, role_value: &str, resource: &str, action: &str) -> bool {
        role_value
            .split(',')
            .map(str::trim)
            .any(|name| self.roles.get(name).is_some_and(|r| r.allows(resource, action)))
    }
}
