//! HTTP handlers for `/api/todos`.
//!
//! Store failures other than a missing record are answered with
//! `400 "<Operation>: <detail>"`; a missing record is always `404 "Not Found"`.

use std::sync::Arc;

use axum::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use tracing::{error, info};

use crate::database::{DatabaseError, TodoStore};
use crate::model::{NewTodo, Todo};

/// Number of records returned by the list endpoint.
pub const LIST_LIMIT: usize = 10;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub type SharedStore = Arc<dyn TodoStore>;

#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    NotFound,
    Failed { op: &'static str, detail: String },
}

impl ApiError {
    fn store(op: &'static str, err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound => ApiError::NotFound,
            other => {
                error!("{}: {}", op, other);
                ApiError::Failed {
                    op,
                    detail: other.to_string(),
                }
            }
        }
    }

    fn bind(detail: String) -> Self {
        error!("Bind: {}", detail);
        ApiError::Failed { op: "Bind", detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            ApiError::Failed { op, detail } => {
                (StatusCode::BAD_REQUEST, format!("{}: {}", op, detail)).into_response()
            }
        }
    }
}

/// Request body for `POST /api/todos`, accepted as JSON or as a urlencoded form.
#[derive(Debug)]
pub struct TodoPayload(pub NewTodo);

#[async_trait]
impl<S> FromRequest<S> for TodoPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| ApiError::bind(e.to_string()))?;
        if bytes.is_empty() {
            // Nothing to bind, whatever the content type; validation in the store decides.
            return Ok(TodoPayload(NewTodo::default()));
        }

        if content_type.starts_with("application/json") {
            let Json(todo) = Json::<NewTodo>::from_bytes(&bytes)
                .map_err(|rejection| ApiError::bind(rejection.body_text()))?;
            return Ok(TodoPayload(todo));
        }
        if content_type.starts_with("application/x-www-form-urlencoded") {
            let req = Request::from_parts(parts, Body::from(bytes));
            let Form(todo) = Form::<NewTodo>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bind(rejection.body_text()))?;
            return Ok(TodoPayload(todo));
        }

        Err(ApiError::bind(format!(
            "unsupported media type {:?}",
            content_type
        )))
    }
}

// A path id that is not an integer cannot name a record.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

pub async fn get_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let todo = store
        .fetch_todo(id)
        .map_err(|e| ApiError::store("SelectOne", e))?;
    Ok(Json(todo))
}

pub async fn list_todos(State(store): State<SharedStore>) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = store
        .fetch_recent(LIST_LIMIT)
        .map_err(|e| ApiError::store("Select", e))?;
    Ok(Json(todos))
}

pub async fn insert_todo(
    State(store): State<SharedStore>,
    TodoPayload(new_todo): TodoPayload,
) -> Result<StatusCode, ApiError> {
    let todo = store
        .add_todo(new_todo)
        .map_err(|e| ApiError::store("Insert", e))?;
    info!(id = todo.id, "inserted todo");
    Ok(StatusCode::CREATED)
}

/// Flips `completed`. The request body is never read.
pub async fn update_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let mut todo = store
        .fetch_todo(id)
        .map_err(|e| ApiError::store("SelectOne", e))?;

    // Not atomic with the fetch: a concurrent PUT or DELETE may win.
    todo.toggle();
    store
        .update_todo(&todo)
        .map_err(|e| ApiError::store("Update", e))?;
    info!(id = todo.id, completed = todo.completed, "updated todo");
    Ok(StatusCode::CREATED)
}

pub async fn remove_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let todo = store
        .fetch_todo(id)
        .map_err(|e| ApiError::store("SelectOne", e))?;
    store
        .delete_todo(todo.id)
        .map_err(|e| ApiError::store("Delete", e))?;
    info!(id = todo.id, "deleted todo");
    Ok(StatusCode::CREATED)
}
