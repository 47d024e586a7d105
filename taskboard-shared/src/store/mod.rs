/// Persistence seam for Taskboard
///
/// Account and task operations are written against these traits rather than
/// a concrete pool, so the same code runs on PostgreSQL in production and on
/// an in-memory store in tests.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: sqlx-backed store over a `PgPool`
/// - [`memory::MemoryStore`]: process-local store, ids assigned sequentially
///
/// # Example
///
/// ```
/// use taskboard_shared::store::{memory::MemoryStore, TaskStore};
/// use taskboard_shared::models::task::CreateTask;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let task = store.insert_task(CreateTask {
///     owner_id: 1,
///     title: "Buy milk".to_string(),
///     description: None,
///     complete: false,
/// }).await?;
/// assert_eq!(task.id, 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    session::{CreateSession, Session},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

pub mod memory;
pub mod postgres;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (e.g. username already taken)
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Account persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; fails with [`StoreError::Duplicate`] on a taken username
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Records a successful login
    async fn touch_last_login(&self, id: i64) -> Result<(), StoreError>;
}

/// Task persistence
///
/// No method here checks ownership; that is the caller's job (see
/// [`crate::tasks`]).
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError>;

    /// Owner's tasks in ascending ID order, optionally narrowed to titles
    /// starting with `title_prefix`
    async fn list_tasks_by_owner(
        &self,
        owner_id: i64,
        title_prefix: Option<&str>,
    ) -> Result<Vec<Task>, StoreError>;

    async fn count_incomplete_by_owner(&self, owner_id: i64) -> Result<i64, StoreError>;

    /// Returns None if the task doesn't exist
    async fn update_task(&self, id: i64, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    /// Returns false if the task doesn't exist
    async fn delete_task(&self, id: i64) -> Result<bool, StoreError>;
}

/// Session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, data: CreateSession) -> Result<Session, StoreError>;

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, StoreError>;

    async fn delete_session(&self, id: i64) -> Result<bool, StoreError>;

    /// Removes sessions expired at or before `now`, returning how many
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Everything the application needs from persistence
///
/// The API server holds an `Arc<dyn Store>`.
#[async_trait]
pub trait Store: UserStore + TaskStore + SessionStore {
    /// Verifies the backing store is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
