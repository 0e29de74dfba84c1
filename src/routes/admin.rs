//! Admin introspection routes. `collections` and `config` sit behind the
//! session gate when a provider is configured; `setup` stays open so a fresh
//! install can detect first-run.

use crate::auth::require_admin;
use crate::handlers::admin::{collections, config, setup};
use crate::state::AppState;
use axum::{middleware, routing::get, Router};

pub fn admin_routes(state: AppState) -> Router {
    if state.settings.admin.disable_admin {
        return Router::new();
    }
    Router::new()
        .route("/__admin/collections", get(collections))
        .route("/__admin/config", get(config))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
        .route("/__admin/setup", get(setup))
        .with_state(state)
}
