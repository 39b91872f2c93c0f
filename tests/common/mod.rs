//! Common test utilities.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use chrono::Utc;
use todo_api::database::{DatabaseError, SqlResult, SqliteStore, TodoStore};
use todo_api::handlers::SharedStore;
use todo_api::model::{NewTodo, Todo};
use todo_api::server::build_app;

pub struct TestApp {
    pub router: Router,
    pub store: SharedStore,
    // Keeps the static directory alive for the duration of the test.
    _static_dir: TempDir,
}

/// Create a test app over an empty in-memory store.
pub fn test_app() -> TestApp {
    test_app_with_store(Arc::new(SqliteStore::open_in_memory().unwrap()))
}

/// Create a test app over the given store.
pub fn test_app_with_store(store: SharedStore) -> TestApp {
    let static_dir = TempDir::new().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>todos</h1>").unwrap();

    TestApp {
        router: build_app(store.clone(), static_dir.path()),
        store,
        _static_dir: static_dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Bytes) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, json: &str) -> (StatusCode, Bytes) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_owned()))
                .unwrap(),
        )
        .await
    }

    pub async fn put(&self, uri: &str) -> (StatusCode, Bytes) {
        self.send(Request::put(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Bytes) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn list(&self) -> Vec<serde_json::Value> {
        let (status, body) = self.get("/api/todos").await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }
}

// ============================================================================
// Stub stores
// ============================================================================

/// Finds every record but loses it before any write lands, as when a
/// concurrent DELETE wins between the fetch and the update.
pub struct VanishingStore;

impl TodoStore for VanishingStore {
    fn fetch_todo(&self, id: i64) -> SqlResult<Todo> {
        Ok(Todo {
            id,
            taskname: "contested".to_string(),
            completed: false,
            created: Utc::now(),
        })
    }

    fn fetch_recent(&self, _limit: usize) -> SqlResult<Vec<Todo>> {
        Ok(vec![])
    }

    fn add_todo(&self, _todo: NewTodo) -> SqlResult<Todo> {
        Err(DatabaseError::Write(rusqlite::Error::InvalidQuery))
    }

    fn update_todo(&self, _todo: &Todo) -> SqlResult<Todo> {
        Err(DatabaseError::NotFound)
    }

    fn delete_todo(&self, _id: i64) -> SqlResult<()> {
        Err(DatabaseError::NotFound)
    }
}

/// Fails every read with a query error.
pub struct BrokenStore;

impl TodoStore for BrokenStore {
    fn fetch_todo(&self, _id: i64) -> SqlResult<Todo> {
        Err(DatabaseError::Query(rusqlite::Error::InvalidQuery))
    }

    fn fetch_recent(&self, _limit: usize) -> SqlResult<Vec<Todo>> {
        Err(DatabaseError::Query(rusqlite::Error::InvalidQuery))
    }

    fn add_todo(&self, _todo: NewTodo) -> SqlResult<Todo> {
        Err(DatabaseError::Write(rusqlite::Error::InvalidQuery))
    }

    fn update_todo(&self, _todo: &Todo) -> SqlResult<Todo> {
        Err(DatabaseError::NotFound)
    }

    fn delete_todo(&self, _id: i64) -> SqlResult<()> {
        Err(DatabaseError::NotFound)
    }
}
