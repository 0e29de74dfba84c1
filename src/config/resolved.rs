//! Resolved schema model: validated once, shared read-only for the process
//! lifetime.

use crate::config::types::{Collection, EngineConfig, Global};
use crate::config::validator;
use crate::error::ConfigError;
use std::collections::HashMap;

/// The validated schema. Wrapped in an `Arc` by the configuration root and
/// handed to adapters, handlers, and the access synthesizer; safe to share
/// across concurrent requests without locking.
#[derive(Clone)]
pub struct SchemaModel {
    collections: Vec<Collection>,
    globals: Vec<Global>,
    by_slug: HashMap<String, usize>,
}

impl SchemaModel {
    /// Validate the declaration and build the slug index.
    pub fn resolve(config: &EngineConfig) -> Result<Self, ConfigError> {
        validator::validate(config)?;
        let by_slug = config
            .collections
            .iter()
            .enumerate()
            .map(|(i, c)| (c.slug.clone(), i))
            .collect();
        Ok(SchemaModel {
            collections: config.collections.clone(),
            globals: config.globals.clone(),
            by_slug,
        })
    }

    pub fn collection(&self, slug: &str) -> Option<&Collection> {
        self.by_slug.get(slug).map(|&i| &self.collections[i])
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }
}
