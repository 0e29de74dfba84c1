//! End-to-end tests: the assembled router over an in-memory SQLite adapter.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use quarry::{
    api_router, AdminConfig, AppState, Collection, CollectionHooks, EngineConfig, Field,
    HookError, SchemaModel, Session, SessionProvider, SessionUser, SqliteAdapter, StorageAdapter,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt;

struct DraftHooks;

#[async_trait]
impl CollectionHooks for DraftHooks {
    async fn before_create(
        &self,
        mut data: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, HookError> {
        if data.get("title") == Some(&json!("boom")) {
            return Err(HookError::new("title rejected"));
        }
        data.insert("views".into(), json!(100));
        Ok(data)
    }

    async fn after_create(&self, doc: &Value) -> Result<(), HookError> {
        if doc["title"] == json!("noisy") {
            return Err(HookError::new("afterCreate exploded"));
        }
        Ok(())
    }
}

struct GuardHooks;

#[async_trait]
impl CollectionHooks for GuardHooks {
    async fn before_delete(&self, _id: i64) -> Result<(), HookError> {
        Err(HookError::new("deletes are not allowed here"))
    }
}

fn engine_config() -> EngineConfig {
    EngineConfig {
        collections: vec![
            Collection::new("posts")
                .field(Field::text("title").required())
                .field(Field::number("views"))
                .field(Field::boolean("published"))
                .timestamps(),
            Collection::new("drafts")
                .field(Field::text("title").required())
                .field(Field::number("views"))
                .hooks(DraftHooks),
            Collection::new("guarded")
                .field(Field::text("title"))
                .hooks(GuardHooks),
            Collection::new("users")
                .field(Field::text("email").required().unique())
                .field(Field::text("name"))
                .field(Field::text("role")),
        ],
        admin: AdminConfig {
            user_collection: Some("users".into()),
            ..Default::default()
        },
        server_url: Some("http://localhost:3000".into()),
        ..Default::default()
    }
}

/// Sessions derived from an `x-role` request header; absent header means no
/// session.
struct HeaderSessions;

#[async_trait]
impl SessionProvider for HeaderSessions {
    async fn get_session(&self, headers: &HeaderMap) -> Option<Session> {
        let role = headers.get("x-role")?.to_str().ok()?;
        Some(Session {
            user: SessionUser {
                id: "u-1".into(),
                role: role.into(),
            },
        })
    }
}

async fn build_app(sessions: Option<Arc<dyn SessionProvider>>) -> Router {
    let config = engine_config();
    let schema = Arc::new(SchemaModel::resolve(&config).unwrap());
    let db: Arc<dyn StorageAdapter> = Arc::new(SqliteAdapter::new(":memory:", schema.clone()));
    db.connect().await.unwrap();
    db.migrate(schema.collections()).await.unwrap();
    let state = AppState::new(&config, schema, db, sessions).unwrap();
    api_router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

async fn send_with_headers(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn list_starts_empty() {
    let app = build_app(None).await;
    let (status, body) = send(&app, "GET", "/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docs"], json!([]));
    assert_eq!(body["totalDocs"], json!(0));
    assert_eq!(body["limit"], json!(10));
}

#[tokio::test]
async fn create_read_update_delete_cycle() {
    let app = build_app(None).await;

    let (status, doc) = send(
        &app,
        "POST",
        "/posts",
        Some(json!({ "title": "New API Post", "views": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["title"], json!("New API Post"));
    let id = doc["id"].as_i64().unwrap();

    let (status, fetched) = send(&app, "GET", &format!("/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], json!("New API Post"));

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/posts/{id}"),
        Some(json!({ "title": "Updated" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], json!("Updated"));
    assert_eq!(updated["views"].as_f64(), Some(100.0));

    let (status, ack) = send(&app, "DELETE", &format!("/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({ "success": true }));

    let (status, body) = send(&app, "GET", &format!("/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Not found" }));
}

#[tokio::test]
async fn missing_and_malformed_ids_are_not_found() {
    let app = build_app(None).await;
    let (status, body) = send(&app, "GET", "/posts/41", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Not found"));

    let (status, _) = send(&app, "GET", "/posts/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PATCH",
        "/posts/41",
        Some(json!({ "title": "nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_acknowledges_even_without_a_row() {
    let app = build_app(None).await;
    let (status, ack) = send(&app, "DELETE", "/posts/12345", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({ "success": true }));
}

#[tokio::test]
async fn unknown_collection_is_not_found() {
    let app = build_app(None).await;
    let (status, _) = send(&app, "GET", "/widgets", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_rejects_missing_required_field() {
    let app = build_app(None).await;
    let (status, body) = send(&app, "POST", "/posts", Some(json!({ "views": 2 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Validation Error"));
    assert_eq!(body["errors"][0]["field"], json!("title"));
}

#[tokio::test]
async fn validation_rejects_wrong_types() {
    let app = build_app(None).await;
    let (status, body) = send(&app, "POST", "/posts", Some(json!({ "title": 123 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Validation Error"));

    let (status, _) = send(
        &app,
        "POST",
        "/posts",
        Some(json!({ "title": "ok", "published": "yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_supports_pagination() {
    let app = build_app(None).await;
    for i in 1..=15 {
        let (status, _) = send(
            &app,
            "POST",
            "/posts",
            Some(json!({ "title": format!("Post {i}"), "views": i })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, page1) = send(&app, "GET", "/posts?limit=10&page=1", None).await;
    assert_eq!(page1["docs"].as_array().unwrap().len(), 10);
    assert_eq!(page1["totalDocs"], json!(15));
    assert_eq!(page1["totalPages"], json!(2));
    assert_eq!(page1["hasNextPage"], json!(true));

    let (_, page2) = send(&app, "GET", "/posts?limit=10&page=2", None).await;
    assert_eq!(page2["docs"].as_array().unwrap().len(), 5);
    assert_eq!(page2["page"], json!(2));
    assert_eq!(page2["hasNextPage"], json!(false));
    assert_eq!(page2["pagingCounter"], json!(11));
}

#[tokio::test]
async fn list_supports_sorting() {
    let app = build_app(None).await;
    send(&app, "POST", "/posts", Some(json!({ "title": "A", "views": 10 }))).await;
    send(&app, "POST", "/posts", Some(json!({ "title": "B", "views": 20 }))).await;

    let (_, desc) = send(&app, "GET", "/posts?sort=-views", None).await;
    assert_eq!(desc["docs"][0]["views"].as_f64(), Some(20.0));

    let (_, asc) = send(&app, "GET", "/posts?sort=views", None).await;
    assert_eq!(asc["docs"][0]["views"].as_f64(), Some(10.0));
}

#[tokio::test]
async fn list_supports_operator_filters() {
    let app = build_app(None).await;
    for (title, views) in [("Low", 5), ("Medium", 15), ("High", 25)] {
        send(
            &app,
            "POST",
            "/posts",
            Some(json!({ "title": title, "views": views })),
        )
        .await;
    }

    // views[gt]=10, bracket characters percent-encoded
    let (status, body) = send(&app, "GET", "/posts?views%5Bgt%5D=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docs"].as_array().unwrap().len(), 2);
    assert!(body["docs"]
        .as_array()
        .unwrap()
        .iter()
        .all(|d| d["views"].as_f64().unwrap() > 10.0));

    let (_, eq) = send(&app, "GET", "/posts?title=Low", None).await;
    assert_eq!(eq["totalDocs"], json!(1));
}

#[tokio::test]
async fn unknown_filter_field_is_a_bad_request() {
    let app = build_app(None).await;
    let (status, _) = send(&app, "GET", "/posts?rating=5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/posts?sort=-rating", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn before_create_hook_transforms_data() {
    let app = build_app(None).await;
    let (status, doc) = send(&app, "POST", "/drafts", Some(json!({ "title": "Draft" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["views"].as_f64(), Some(100.0));
}

#[tokio::test]
async fn before_hook_failure_aborts_with_server_error() {
    let app = build_app(None).await;
    let (status, _) = send(&app, "POST", "/drafts", Some(json!({ "title": "boom" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Nothing persisted.
    let (_, list) = send(&app, "GET", "/drafts", None).await;
    assert_eq!(list["totalDocs"], json!(0));
}

#[tokio::test]
async fn after_create_failure_is_log_only() {
    let app = build_app(None).await;
    let (status, doc) = send(&app, "POST", "/drafts", Some(json!({ "title": "noisy" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    // The row committed despite the failing afterCreate hook.
    let id = doc["id"].as_i64().unwrap();
    let (status, _) = send(&app, "GET", &format!("/drafts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn before_delete_hook_can_abort() {
    let app = build_app(None).await;
    let (_, doc) = send(&app, "POST", "/guarded", Some(json!({ "title": "keep" }))).await;
    let id = doc["id"].as_i64().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/guarded/{id}"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, "GET", &format!("/guarded/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn first_user_signup_is_promoted_and_setup_flips() {
    let app = build_app(None).await;

    let (_, setup) = send(&app, "GET", "/__admin/setup", None).await;
    assert_eq!(setup, json!({ "isSetup": false }));

    let (status, first) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "email": "first@x.y", "name": "First" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["role"], json!("admin"));

    // Self-assigned roles are ignored.
    let (_, second) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "email": "second@x.y", "role": "admin" })),
    )
    .await;
    assert_eq!(second["role"], json!("user"));

    let (_, setup) = send(&app, "GET", "/__admin/setup", None).await;
    assert_eq!(setup, json!({ "isSetup": true }));
}

#[tokio::test]
async fn duplicate_unique_field_is_a_conflict() {
    let app = build_app(None).await;
    send(&app, "POST", "/users", Some(json!({ "email": "a@b.c" }))).await;
    let (status, _) = send(&app, "POST", "/users", Some(json!({ "email": "a@b.c" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_routes_are_open_without_a_session_provider() {
    let app = build_app(None).await;
    let (status, body) = send(&app, "GET", "/__admin/collections", None).await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body["collections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert!(slugs.contains(&"posts"));
    assert!(slugs.contains(&"users"));

    let (status, config) = send(&app, "GET", "/__admin/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["serverURL"], json!("http://localhost:3000"));
    assert_eq!(config["admin"]["userCollection"], json!("users"));
}

#[tokio::test]
async fn admin_routes_require_an_admin_session_when_configured() {
    let app = build_app(Some(Arc::new(HeaderSessions))).await;

    let (status, body) = send(&app, "GET", "/__admin/collections", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Unauthorized" }));

    let (status, body) = send_with_headers(
        &app,
        "GET",
        "/__admin/collections",
        None,
        &[("x-role", "user")],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Forbidden" }));

    let (status, _) = send_with_headers(
        &app,
        "GET",
        "/__admin/collections",
        None,
        &[("x-role", "user,admin")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Setup stays open for first-run detection.
    let (status, _) = send(&app, "GET", "/__admin/setup", None).await;
    assert_eq!(status, StatusCode::OK);

    // Content routes are not gated by the admin middleware.
    let (status, _) = send(&app, "GET", "/posts", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn common_routes_respond() {
    let app = build_app(None).await;
    let (status, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health, json!({ "status": "ok" }));

    let (status, ready) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["database"], json!("ok"));

    let (status, version) = send(&app, "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(version["name"], json!("quarry"));
}
