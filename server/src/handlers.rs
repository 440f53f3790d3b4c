//! HTTP handlers for the `/todos` resource.
//!
//! Batches are validated in full before the first write. Writes then run one
//! record at a time with no surrounding transaction, so a store failure part
//! way through leaves the earlier records committed.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use todo_core::{validate_new_batch, validate_update_batch, PageRequest, Todo, TodoBatch, TodoPage};

use crate::error::ApiError;
use crate::AppState;

/// Body of the plain confirmation responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raw `page` / `limit` query values; parsing is lenient by contract.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn bind_batch(payload: Result<Json<TodoBatch>, JsonRejection>) -> Result<TodoBatch, ApiError> {
    payload
        .map(|Json(batch)| batch)
        .map_err(|rejection| ApiError::InvalidPayload(rejection.body_text()))
}

pub async fn add_todos(
    State(state): State<AppState>,
    payload: Result<Json<TodoBatch>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoBatch<Todo>>), ApiError> {
    let batch = bind_batch(payload)?;
    let todos = validate_new_batch(&batch.todos)?;

    let mut created = Vec::with_capacity(todos.len());
    for todo in &todos {
        let stored = state
            .store
            .create(todo)
            .await
            .map_err(|err| ApiError::write("failed to create todo", err))?;
        created.push(stored);
    }

    tracing::info!(count = created.len(), "created todos");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Echoes the submitted records, not the rows as stored.
pub async fn update_todos(
    State(state): State<AppState>,
    payload: Result<Json<TodoBatch>, JsonRejection>,
) -> Result<Json<TodoBatch>, ApiError> {
    let batch = bind_batch(payload)?;
    let updates = validate_update_batch(&batch.todos)?;

    for (id, changes) in &updates {
        let affected = state
            .store
            .update_by_id(*id, changes)
            .await
            .map_err(|err| ApiError::write("failed to update todo", err))?;
        if affected == 0 {
            tracing::debug!(id, "update matched no row");
        }
    }

    tracing::info!(count = updates.len(), "updated todos");
    Ok(Json(batch))
}

pub async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<TodoPage>, ApiError> {
    let request = PageRequest::from_query(params.page.as_deref(), params.limit.as_deref());

    let total = state
        .store
        .count()
        .await
        .map_err(|err| ApiError::read("failed to count todos", err))?;
    let todos = state
        .store
        .find_page(request.window())
        .await
        .map_err(|err| ApiError::read("failed to list todos", err))?;

    Ok(Json(TodoPage::new(todos, request, total)))
}

/// Succeeds whether or not a row matched.
pub async fn delete_todo_by_id(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let raw_id = raw_id.trim();
    if raw_id.is_empty() {
        return Err(ApiError::MissingPathId);
    }
    let id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::InvalidPathId(raw_id.to_string()))?;

    let removed = state
        .store
        .delete_by_id(id)
        .await
        .map_err(|err| ApiError::write("failed to delete todo", err))?;
    tracing::info!(id, removed, "deleted todo");

    Ok(Json(Message::new(format!(
        "Todo with id {raw_id} deleted successfully"
    ))))
}

/// `DELETE /todos` with no id segment.
pub async fn delete_todo_without_id() -> ApiError {
    ApiError::MissingPathId
}

pub async fn mark_all_as_done(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    let updated = state
        .store
        .mark_all_complete()
        .await
        .map_err(|err| ApiError::write("failed to mark all todos as done", err))?;
    tracing::info!(updated, "marked all todos as done");

    Ok(Json(Message::new("All todos marked as done")))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
