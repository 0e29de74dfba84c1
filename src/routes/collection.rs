//! Content CRUD routes built from the schema model.
//!
//! Parameterized paths so one route set serves every collection; handlers
//! resolve the collection by slug.

use crate::handlers::collection::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Field data is JSON, not uploads; cap request bodies accordingly.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

pub fn collection_routes(state: AppState) -> Router {
    Router::new()
        .route("/:slug", get(list).post(create))
        .route(
            "/:slug/:id",
            get(read).patch(update).delete(delete_handler),
        )
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .with_state(state)
}
