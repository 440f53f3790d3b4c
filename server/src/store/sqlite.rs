//! Embedded, file-backed engine.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use todo_core::{NewTodo, PageWindow, StoreErrorKind, Todo, TodoChanges};

use super::{classify_common, Engine, ErrorClassifier, StoreResult, TodoRow, TodoStore, TODO_COLUMNS};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL UNIQUE,
    description TEXT,
    due_date    TEXT,
    complete    BOOLEAN NOT NULL DEFAULT 0,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
)
"#;

const UNIQUE_MARKER: &str = "UNIQUE constraint failed";

/// Duplicate-key detection for SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteClassifier;

impl SqliteClassifier {
    pub fn is_duplicate_message(message: &str) -> bool {
        message.contains(UNIQUE_MARKER)
    }
}

impl ErrorClassifier for SqliteClassifier {
    fn classify(&self, error: &sqlx::Error) -> StoreErrorKind {
        if let Some(kind) = classify_common(error) {
            return kind;
        }
        match error {
            sqlx::Error::Database(db)
                if db.is_unique_violation() || Self::is_duplicate_message(db.message()) =>
            {
                StoreErrorKind::Conflict
            }
            sqlx::Error::Database(db) if db.message().contains("database is locked") => {
                StoreErrorKind::Transient
            }
            _ => StoreErrorKind::Fatal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: &str) -> StoreResult<Self> {
        tracing::info!(path, "using sqlite database");
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Self::with_pool(pool).await
    }

    /// A private in-memory database. One connection that never expires, so
    /// the data lives as long as the store.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new())
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl TodoStore for SqliteStore {
    fn engine(&self) -> Engine {
        Engine::Sqlite
    }

    async fn create(&self, todo: &NewTodo) -> StoreResult<Todo> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO todos (title, description, due_date, complete, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {TODO_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.due_date)
            .bind(todo.complete)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Ok(row.into_todo())
    }

    async fn find_page(&self, window: PageWindow) -> StoreResult<Vec<Todo>> {
        // A negative LIMIT means "no limit" in SQLite.
        let sql = format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(window.limit.unwrap_or(-1))
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Ok(rows.into_iter().map(TodoRow::into_todo).collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))
    }

    async fn update_by_id(&self, id: i64, changes: &TodoChanges) -> StoreResult<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE todos SET updated_at = ");
        builder.push_bind(Utc::now());
        if let Some(title) = &changes.title {
            builder.push(", title = ").push_bind(title.as_str());
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description.as_str());
        }
        if let Some(due_date) = changes.due_date {
            builder.push(", due_date = ").push_bind(due_date);
        }
        if let Some(complete) = changes.complete {
            builder.push(", complete = ").push_bind(complete);
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Ok(result.rows_affected())
    }

    async fn mark_all_complete(&self) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE todos SET complete = 1, updated_at = ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| SqliteClassifier.wrap(e))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    #[test]
    fn recognizes_unique_message() {
        assert!(SqliteClassifier::is_duplicate_message(
            "UNIQUE constraint failed: todos.title"
        ));
        assert!(!SqliteClassifier::is_duplicate_message(
            "NOT NULL constraint failed: todos.title"
        ));
    }

    #[tokio::test]
    async fn create_assigns_ids_and_timestamps() {
        let store = store().await;
        let first = store.create(&NewTodo::titled("one")).await.unwrap();
        let second = store.create(&NewTodo::titled("two")).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.created_at, first.updated_at);
        assert!(!first.complete);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn create_round_trips_optional_fields() {
        let store = store().await;
        let due = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let created = store
            .create(&NewTodo {
                title: "renew passport".into(),
                description: Some("bring photos".into()),
                due_date: Some(due),
                complete: true,
            })
            .await
            .unwrap();

        let listed = store
            .find_page(PageWindow { limit: None, offset: 0 })
            .await
            .unwrap();
        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(created.due_date, Some(due));
        assert_eq!(created.description.as_deref(), Some("bring photos"));
    }

    #[tokio::test]
    async fn duplicate_title_is_a_conflict() {
        let store = store().await;
        store.create(&NewTodo::titled("same")).await.unwrap();
        let err = store.create(&NewTodo::titled("same")).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Conflict);
    }

    #[tokio::test]
    async fn update_touches_only_supplied_fields() {
        let store = store().await;
        let created = store
            .create(&NewTodo {
                description: Some("keep me".into()),
                ..NewTodo::titled("before")
            })
            .await
            .unwrap();

        let changes = TodoChanges {
            title: Some("after".into()),
            ..TodoChanges::default()
        };
        assert_eq!(store.update_by_id(created.id, &changes).await.unwrap(), 1);
        assert_eq!(store.update_by_id(created.id + 100, &changes).await.unwrap(), 0);

        let rows = store
            .find_page(PageWindow { limit: Some(10), offset: 0 })
            .await
            .unwrap();
        assert_eq!(rows[0].title, "after");
        assert_eq!(rows[0].description.as_deref(), Some("keep me"));
        assert!(rows[0].updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn empty_changes_do_not_touch_the_row() {
        let store = store().await;
        let created = store.create(&NewTodo::titled("idle")).await.unwrap();
        let affected = store
            .update_by_id(created.id, &TodoChanges::default())
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn window_limits_and_offsets() {
        let store = store().await;
        for title in ["a", "b", "c"] {
            store.create(&NewTodo::titled(title)).await.unwrap();
        }

        let page = store
            .find_page(PageWindow { limit: Some(1), offset: 1 })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "b");

        let none = store
            .find_page(PageWindow { limit: Some(0), offset: 0 })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn delete_and_mark_all() {
        let store = store().await;
        let a = store.create(&NewTodo::titled("a")).await.unwrap();
        store.create(&NewTodo::titled("b")).await.unwrap();

        assert_eq!(store.delete_by_id(a.id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(a.id).await.unwrap(), 0);
        assert_eq!(store.mark_all_complete().await.unwrap(), 1);

        let rows = store
            .find_page(PageWindow { limit: None, offset: 0 })
            .await
            .unwrap();
        assert!(rows.iter().all(|todo| todo.complete));
    }
}
