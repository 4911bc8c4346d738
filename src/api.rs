//! The todo endpoints.
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | `POST` | `/create` | `200 {"todo": <record>}` |
//! | `GET` | `/{id}` | `200 <record>` |
//! | `PUT` | `/{id}` | `200 <record after update>` |
//! | `DELETE` | `/{id}` | `200 {"message": "Deleted successfully"}` |
//!
//! Every failure is answered with `{"error": "<message>"}`. Store failures
//! get a fixed per-operation message; their detail goes to the log only.

use std::fmt;

use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::handler::with_state;
use crate::health;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::store::{SharedStore, StoreError};
use crate::todo::{NewTodo, Todo, TodoChanges, TodoId};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The four todo operations, for error messages and logs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Get,
}

impl Operation {
    /// The message clients see when the operation fails unexpectedly.
    fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "Failed to create todo",
            Self::Update => "Failed to update todo",
            Self::Delete => "Failed to delete todo",
            Self::Get => "Failed to get todo",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Get => "get",
        })
    }
}

/// A request that could not be served.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Todo with this title already exists")]
    DuplicateTitle,

    #[error("Todo not found")]
    NotFound,

    #[error("Invalid JSON body")]
    InvalidBody(#[source] serde_json::Error),

    /// Anything unexpected. The client only sees the operation's failure
    /// message.
    #[error("{}", .op.failure_message())]
    Internal {
        op: Operation,
        #[source]
        source: BoxError,
    },
}

impl ApiError {
    fn internal(op: Operation, source: impl Into<BoxError>) -> Self {
        Self::Internal { op, source: source.into() }
    }

    fn from_store(op: Operation, err: StoreError) -> Self {
        match err {
            StoreError::DuplicateTitle(_) => Self::DuplicateTitle,
            other => Self::internal(op, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateTitle | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { op, source } = &self {
            error!(%op, error = %source, "error in {op} todo");
        }
        Json(json!({ "error": self.to_string() }))
            .with_status(self.status())
            .into_response()
    }
}

#[derive(Serialize)]
struct Created {
    todo: Todo,
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

/// Builds the application router over `store`.
pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .on(Method::POST, "/create", with_state(store.clone(), create_todo))
        .on(Method::GET, "/healthz", health::liveness)
        .on(Method::GET, "/readyz", with_state(store.clone(), health::readiness))
        .on(Method::GET, "/{id}", with_state(store.clone(), get_todo))
        .on(Method::PUT, "/{id}", with_state(store.clone(), update_todo))
        .on(Method::DELETE, "/{id}", with_state(store, delete_todo))
}

fn path_id(req: &Request, op: Operation) -> Result<TodoId, ApiError> {
    req.param("id")
        .unwrap_or_default()
        .parse()
        .map_err(|e| ApiError::internal(op, e))
}

/// `POST /create`
///
/// The title lookup is the fast path; the store's own uniqueness check
/// catches a concurrent create that slips between lookup and insert.
async fn create_todo(store: SharedStore, req: Request) -> Result<Json<Created>, ApiError> {
    let op = Operation::Create;
    let new: NewTodo = req.json().map_err(ApiError::InvalidBody)?;

    let existing = store
        .find_by_title(&new.title)
        .await
        .map_err(|e| ApiError::from_store(op, e))?;
    if existing.is_some() {
        return Err(ApiError::DuplicateTitle);
    }

    let todo = store.insert(new).await.map_err(|e| ApiError::from_store(op, e))?;
    Ok(Json(Created { todo }))
}

/// `GET /{id}`
async fn get_todo(store: SharedStore, req: Request) -> Result<Json<Todo>, ApiError> {
    let op = Operation::Get;
    let id = path_id(&req, op)?;

    store
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::from_store(op, e))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `PUT /{id}`
async fn update_todo(store: SharedStore, req: Request) -> Result<Json<Todo>, ApiError> {
    let op = Operation::Update;
    let id = path_id(&req, op)?;
    let changes: TodoChanges = req.json().map_err(ApiError::InvalidBody)?;

    store
        .update_by_id(id, changes)
        .await
        .map_err(|e| ApiError::from_store(op, e))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `DELETE /{id}`
async fn delete_todo(store: SharedStore, req: Request) -> Result<Json<Message>, ApiError> {
    let op = Operation::Delete;
    let id = path_id(&req, op)?;

    store
        .delete_by_id(id)
        .await
        .map_err(|e| ApiError::from_store(op, e))?
        .map(|_| Json(Message { message: "Deleted successfully" }))
        .ok_or(ApiError::NotFound)
}
