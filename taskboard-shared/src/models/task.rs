/// Task model and database operations
///
/// A task is a to-do item owned by exactly one user. The owner and the
/// creation timestamp are fixed at insert; title, description and the
/// completion flag can be replaced by the owner.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     owner_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     complete BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{Task, CreateTask};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     owner_id: 1,
///     title: "Buy milk".to_string(),
///     description: None,
///     complete: false,
/// }).await?;
///
/// let mine = Task::list_by_owner(&pool, 1, Some("Buy")).await?;
/// assert!(mine.iter().any(|t| t.id == task.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// To-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID, stable for the task's lifetime
    pub id: i64,

    /// User who created (and owns) the task
    pub owner_id: i64,

    /// Short title, never empty
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Whether the task is done
    pub complete: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub complete: bool,
}

/// Replacement values for the mutable fields of a task
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub title: String,
    pub description: Option<String>,
    pub complete: bool,
}

impl Task {
    /// Inserts a new task and returns it with its assigned ID
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner_id, title, description, complete)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, title, description, complete, created_at
            "#,
        )
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.complete)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, complete, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists an owner's tasks in ID order
    ///
    /// When `title_prefix` is given, only tasks whose title starts with it
    /// (case-sensitive) are returned. `starts_with` is used instead of `LIKE`
    /// so that `%` and `_` in the prefix match literally.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: i64,
        title_prefix: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, complete, created_at
            FROM tasks
            WHERE owner_id = $1
              AND ($2::TEXT IS NULL OR starts_with(title, $2))
            ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .bind(title_prefix)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts an owner's tasks that are not yet complete
    pub async fn count_incomplete_by_owner(
        pool: &PgPool,
        owner_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE owner_id = $1 AND complete = FALSE",
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Replaces title, description and completion flag
    ///
    /// Returns None if the task doesn't exist. Owner and `created_at` are
    /// never touched.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                complete = $4
            WHERE id = $1
            RETURNING id, owner_id, title, description, complete, created_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.complete)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
