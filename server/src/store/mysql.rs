//! Networked MySQL engine.
//!
//! On connect the configured database is created if it does not exist, then
//! the pool is opened against it and the `todos` table is created if absent.
//! MySQL has no `RETURNING`, so inserts read the row back by
//! `LAST_INSERT_ID()`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlPool, MySqlPoolOptions};
use sqlx::{Connection, MySql, QueryBuilder};
use todo_core::{NewTodo, PageWindow, StoreErrorKind, Todo, TodoChanges};

use super::{classify_common, Engine, ErrorClassifier, StoreResult, TodoRow, TodoStore, TODO_COLUMNS};
use crate::config::MySqlConfig;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id          BIGINT      NOT NULL AUTO_INCREMENT PRIMARY KEY,
    title       VARCHAR(191) NOT NULL,
    description LONGTEXT    NULL,
    due_date    DATETIME(6) NULL,
    complete    TINYINT(1)  NOT NULL DEFAULT 0,
    created_at  DATETIME(6) NOT NULL,
    updated_at  DATETIME(6) NOT NULL,
    UNIQUE KEY idx_todos_title (title)
) CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci
"#;

const ER_DUP_ENTRY: u16 = 1062;
const DUPLICATE_MARKERS: [&str; 2] = ["Duplicate entry", "Error 1062"];

/// Duplicate-key detection for MySQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlClassifier;

impl MySqlClassifier {
    pub fn is_duplicate_message(message: &str) -> bool {
        DUPLICATE_MARKERS.iter().any(|marker| message.contains(marker))
    }
}

impl ErrorClassifier for MySqlClassifier {
    fn classify(&self, error: &sqlx::Error) -> StoreErrorKind {
        if let Some(kind) = classify_common(error) {
            return kind;
        }
        let sqlx::Error::Database(db) = error else {
            return StoreErrorKind::Fatal;
        };
        let number = db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(MySqlDatabaseError::number);
        if number == Some(ER_DUP_ENTRY)
            || db.is_unique_violation()
            || Self::is_duplicate_message(db.message())
        {
            StoreErrorKind::Conflict
        } else {
            StoreErrorKind::Fatal
        }
    }
}

#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(config: &MySqlConfig) -> StoreResult<Self> {
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "using mysql database"
        );
        let server = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .charset("utf8mb4");

        let mut conn = MySqlConnection::connect_with(&server)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        let create_database = format!(
            "CREATE DATABASE IF NOT EXISTS `{}` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci",
            config.database.replace('`', "``")
        );
        sqlx::query(&create_database)
            .execute(&mut conn)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        conn.close().await.map_err(|e| MySqlClassifier.wrap(e))?;

        let pool = MySqlPoolOptions::new()
            .connect_with(server.database(&config.database))
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: MySqlPool) -> StoreResult<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl TodoStore for MySqlStore {
    fn engine(&self) -> Engine {
        Engine::MySql
    }

    async fn create(&self, todo: &NewTodo) -> StoreResult<Todo> {
        let now = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO todos (title, description, due_date, complete, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.due_date)
        .bind(todo.complete)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| MySqlClassifier.wrap(e))?;

        let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?");
        let row = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(inserted.last_insert_id())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        Ok(row.into_todo())
    }

    async fn find_page(&self, window: PageWindow) -> StoreResult<Vec<Todo>> {
        let sql = format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(window.limit.unwrap_or(i64::MAX))
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        Ok(rows.into_iter().map(TodoRow::into_todo).collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))
    }

    async fn update_by_id(&self, id: i64, changes: &TodoChanges) -> StoreResult<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<MySql>::new("UPDATE todos SET updated_at = ");
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
            .map_err(|e| MySqlClassifier.wrap(e))?;
        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        Ok(result.rows_affected())
    }

    async fn mark_all_complete(&self) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE todos SET complete = TRUE, updated_at = ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| MySqlClassifier.wrap(e))?;
        Ok(result.rows_affected())
    }
}
