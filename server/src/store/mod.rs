//! Persistence gateway.
//!
//! # Design
//! Handlers talk to storage only through [`TodoStore`], held as
//! `Arc<dyn TodoStore>` in router state. Two engines implement it: an
//! embedded SQLite file and a networked MySQL server, chosen once at startup
//! by [`connect`]. Each engine ships an [`ErrorClassifier`] that folds its
//! driver errors into [`StoreErrorKind`], so duplicate-key detection lives
//! next to the engine that produces the error instead of in the handlers.
//!
//! No method retries, locks or wraps a transaction; concurrency control is
//! the engine's job.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::FromRow;
use thiserror::Error;
use todo_core::{NewTodo, PageWindow, StoreErrorKind, Todo, TodoChanges};

use crate::config::DatabaseConfig;

pub mod mysql;
pub mod sqlite;

pub use mysql::{MySqlClassifier, MySqlStore};
pub use sqlite::{SqliteClassifier, SqliteStore};

/// Columns selected for every read, in `TodoRow` order.
pub(crate) const TODO_COLUMNS: &str =
    "id, title, description, due_date, complete, created_at, updated_at";

/// A classified persistence failure. `Display` is the driver's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == StoreErrorKind::Conflict
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Maps one engine's `sqlx::Error` shapes onto `StoreErrorKind`.
pub trait ErrorClassifier {
    fn classify(&self, error: &sqlx::Error) -> StoreErrorKind;

    fn wrap(&self, error: sqlx::Error) -> StoreError {
        StoreError::new(self.classify(&error), error.to_string())
    }
}

/// Classification that does not depend on the engine. Returns `None` for
/// database-reported errors, which each classifier inspects itself.
pub(crate) fn classify_common(error: &sqlx::Error) -> Option<StoreErrorKind> {
    match error {
        sqlx::Error::Database(_) => None,
        sqlx::Error::RowNotFound => Some(StoreErrorKind::NotFound),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Some(StoreErrorKind::Transient),
        _ => Some(StoreErrorKind::Fatal),
    }
}

/// Storage engine behind a [`TodoStore`], for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Sqlite,
    MySql,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Sqlite => write!(f, "sqlite"),
            Engine::MySql => write!(f, "mysql"),
        }
    }
}

/// The capability set handlers need from a relational store.
#[async_trait]
pub trait TodoStore: Send + Sync {
    fn engine(&self) -> Engine;

    /// Insert one record, returning it with its generated id and timestamps.
    async fn create(&self, todo: &NewTodo) -> StoreResult<Todo>;

    /// Rows in ascending id order within `window`.
    async fn find_page(&self, window: PageWindow) -> StoreResult<Vec<Todo>>;

    async fn count(&self) -> StoreResult<i64>;

    /// Apply `changes` to the row with `id` and bump `updated_at`. Returns the
    /// number of rows affected; an unknown id affects none.
    async fn update_by_id(&self, id: i64, changes: &TodoChanges) -> StoreResult<u64>;

    /// Returns the number of rows removed; an unknown id removes none.
    async fn delete_by_id(&self, id: i64) -> StoreResult<u64>;

    /// Set `complete` on every row.
    async fn mark_all_complete(&self) -> StoreResult<u64>;
}

/// Row shape shared by both engines.
#[derive(Debug, FromRow)]
pub(crate) struct TodoRow {
    id: i64,
    title: String,
    description: Option<String>,
    due_date: Option<chrono::DateTime<chrono::Utc>>,
    complete: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TodoRow {
    pub(crate) fn into_todo(self) -> Todo {
        Todo {
            id: self.id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            complete: self.complete,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Open the engine named by `config` and make sure the schema exists.
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Arc<dyn TodoStore>> {
    let store: Arc<dyn TodoStore> = match config {
        DatabaseConfig::Sqlite { path } => Arc::new(SqliteStore::open(path).await?),
        DatabaseConfig::MySql(mysql) => Arc::new(MySqlStore::connect(mysql).await?),
    };
    tracing::info!(engine = %store.engine(), "database connected and migrated");
    Ok(store)
}
