//! Todo REST service.
//!
//! # Overview
//! Axum router over a [`store::TodoStore`]. The binary wires configuration,
//! tracing and the store together; tests build the same router around an
//! in-memory SQLite store.
//!
//! # Routes
//! - `POST   /todos` add a batch
//! - `PATCH  /todos` update a batch by id
//! - `GET    /todos?page=&limit=` paginated list
//! - `DELETE /todos/{id}` delete one (idempotent)
//! - `PATCH  /todos/mark-all-as-done`
//!
//! All of them sit behind the `X-API-Key` gate when a key is configured.

use std::future::Future;
use std::sync::Arc;

use axum::routing::{delete, get, patch};
use axum::{middleware, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod store;

use crate::auth::ApiKey;
use crate::config::ConfigError;
use crate::store::{StoreError, TodoStore};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
}

/// Reasons the process can fail to start or keep serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open database: {0}")]
    Store(#[from] StoreError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the router. With `api_key` set, every todo route requires it in
/// the `X-API-Key` header; without one the routes are open and a warning is
/// logged.
pub fn app(store: Arc<dyn TodoStore>, api_key: Option<String>) -> Router {
    let todos = Router::new()
        .route(
            "/todos",
            get(handlers::list_todos)
                .post(handlers::add_todos)
                .patch(handlers::update_todos)
                .delete(handlers::delete_todo_without_id),
        )
        .route("/todos/", delete(handlers::delete_todo_without_id))
        .route("/todos/mark-all-as-done", patch(handlers::mark_all_as_done))
        .route("/todos/{id}", delete(handlers::delete_todo_by_id));

    let todos = match api_key {
        Some(key) => {
            tracing::info!("api key gate enabled");
            todos.route_layer(middleware::from_fn_with_state(
                ApiKey::new(key),
                auth::require_api_key,
            ))
        }
        None => {
            tracing::warn!("API_KEY is not set; todo routes are unauthenticated");
            todos
        }
    };

    todos
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

pub async fn run<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
