/// PostgreSQL store
///
/// Thin adapter from the store traits to the model functions in
/// [`crate::models`]. Unique violations are surfaced as
/// [`StoreError::Duplicate`] so callers never inspect driver errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{SessionStore, Store, StoreError, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::{
    session::{CreateSession, Session},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to `Duplicate`, everything else to `Database`
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Duplicate(constraint);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        User::create(&self.pool, data)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn touch_last_login(&self, id: i64) -> Result<(), StoreError> {
        User::update_last_login(&self.pool, id).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks_by_owner(
        &self,
        owner_id: i64,
        title_prefix: Option<&str>,
    ) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_owner(&self.pool, owner_id, title_prefix).await?)
    }

    async fn count_incomplete_by_owner(&self, owner_id: i64) -> Result<i64, StoreError> {
        Ok(Task::count_incomplete_by_owner(&self.pool, owner_id).await?)
    }

    async fn update_task(&self, id: i64, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: i64) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, data: CreateSession) -> Result<Session, StoreError> {
        Session::create(&self.pool, data)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, StoreError> {
        Ok(Session::find_by_token_hash(&self.pool, token_hash).await?)
    }

    async fn delete_session(&self, id: i64) -> Result<bool, StoreError> {
        Ok(Session::delete(&self.pool, id).await?)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(Session::delete_expired(&self.pool, now).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
