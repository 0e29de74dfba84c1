//! Router assembly: content CRUD + admin introspection + common routes.

mod admin;
mod collection;
mod common;

pub use admin::admin_routes;
pub use collection::collection_routes;
pub use common::common_routes;

use crate::state::AppState;
use axum::Router;

/// The full routing table for one engine instance. Static engine routes
/// (`/health`, `/__admin/*`) take precedence over the `/:slug` content
/// pattern.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .merge(collection_routes(state))
}
