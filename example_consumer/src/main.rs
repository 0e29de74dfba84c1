//! Example host: declares a small content schema and serves the derived API
//! over an embedded SQLite database.
//!
//! Run from repo root: `cargo run -p example-consumer`

use quarry::{
    api_router, AdminConfig, AppState, Collection, EngineConfig, Field, SchemaModel,
    SqliteAdapter, StorageAdapter,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quarry=info")),
        )
        .init();

    let config = EngineConfig {
        collections: vec![
            Collection::new("posts")
                .field(Field::text("title").required())
                .field(Field::richtext("body"))
                .field(Field::number("views").default_value(0))
                .field(Field::boolean("published").default_value(false))
                .field(Field::array("tags"))
                .timestamps(),
            Collection::new("users")
                .field(Field::text("email").required().unique())
                .field(Field::text("name"))
                .field(Field::text("role"))
                .timestamps(),
        ],
        admin: AdminConfig {
            user_collection: Some("users".into()),
            ..Default::default()
        },
        server_url: Some("http://127.0.0.1:3000".into()),
        ..Default::default()
    };

    let schema = Arc::new(SchemaModel::resolve(&config)?);
    let db_path = std::env::var("QUARRY_DB").unwrap_or_else(|_| "quarry.db".into());
    let db: Arc<dyn StorageAdapter> = Arc::new(SqliteAdapter::new(db_path, schema.clone()));
    db.connect().await?;
    db.migrate(schema.collections()).await?;

    let state = AppState::new(&config, schema, db, None)?;
    let app = api_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
