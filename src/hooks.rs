//! Lifecycle hooks: caller-supplied extension points around CRUD operations.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Raised by a hook to abort the surrounding operation.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        HookError(message.into())
    }
}

/// Extension points invoked by the CRUD handlers.
///
/// `before_*` hooks run before the write and may transform the incoming data
/// or abort it by returning an error. `after_*` hooks observe the committed
/// result and cannot veto it: a failure there is logged and the response
/// still reports success, since the row is already persisted and the engine
/// performs no compensating writes.
#[async_trait]
pub trait CollectionHooks: Send + Sync {
    async fn before_create(
        &self,
        data: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, HookError> {
        Ok(data)
    }

    async fn after_create(&self, _doc: &Value) -> Result<(), HookError> {
        Ok(())
    }

    async fn before_update(
        &self,
        data: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, HookError> {
        Ok(data)
    }

    async fn after_update(&self, _doc: &Value) -> Result<(), HookError> {
        Ok(())
    }

    async fn before_delete(&self, _id: i64) -> Result<(), HookError> {
        Ok(())
    }

    async fn after_delete(&self, _id: i64) -> Result<(), HookError> {
        Ok(())
    }
}
