/// In-memory store
///
/// Keeps users, tasks and sessions in `BTreeMap`s behind a single tokio
/// mutex. IDs start at 1 and increase monotonically per table, so iteration
/// order is ID order. Used by tests and for running without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{SessionStore, Store, StoreError, TaskStore, UserStore};
use crate::models::{
    session::{CreateSession, Session},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    sessions: BTreeMap<i64, Session>,
    next_user_id: i64,
    next_task_id: i64,
    next_session_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Duplicate("users_username_key".to_string()));
        }

        let user = User {
            id: next_id(&mut tables.next_user_id),
            username: data.username,
            password_hash: data.password_hash,
            date_joined: Utc::now(),
            last_login: None,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn touch_last_login(&self, id: i64) -> Result<(), StoreError> {
        if let Some(user) = self.tables.lock().await.users.get_mut(&id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.lock().await;

        let task = Task {
            id: next_id(&mut tables.next_task_id),
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            complete: data.complete,
            created_at: Utc::now(),
        };
        tables.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.lock().await.tasks.get(&id).cloned())
    }

    async fn list_tasks_by_owner(
        &self,
        owner_id: i64,
        title_prefix: Option<&str>,
    ) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .tasks
            .values()
            .filter(|t| t.owner_id == owner_id)
            .filter(|t| title_prefix.map_or(true, |prefix| t.title.starts_with(prefix)))
            .cloned()
            .collect())
    }

    async fn count_incomplete_by_owner(&self, owner_id: i64) -> Result<i64, StoreError> {
        let tables = self.tables.lock().await;

        let count = tables
            .tasks
            .values()
            .filter(|t| t.owner_id == owner_id && !t.complete)
            .count();

        Ok(count as i64)
    }

    async fn update_task(&self, id: i64, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.lock().await;

        Ok(tables.tasks.get_mut(&id).map(|task| {
            task.title = data.title;
            task.description = data.description;
            task.complete = data.complete;
            task.clone()
        }))
    }

    async fn delete_task(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.tasks.remove(&id).is_some())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, data: CreateSession) -> Result<Session, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.sessions.values().any(|s| s.token_hash == data.token_hash) {
            return Err(StoreError::Duplicate("sessions_token_hash_key".to_string()));
        }

        let session = Session {
            id: next_id(&mut tables.next_session_id),
            user_id: data.user_id,
            token_hash: data.token_hash,
            created_at: Utc::now(),
            expires_at: data.expires_at,
        };
        tables.sessions.insert(session.id, session.clone());

        Ok(session)
    }

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn delete_session(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.sessions.remove(&id).is_some())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;

        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired_at(now));

        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_task(owner_id: i64, title: &str, complete: bool) -> CreateTask {
        CreateTask {
            owner_id,
            title: title.to_string(),
            description: None,
            complete,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        let data = CreateUser {
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
        };

        store.insert_user(data.clone()).await.unwrap();
        let result = store.insert_user(data).await;

        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_never_reused() {
        let store = MemoryStore::new();

        let first = store.insert_task(new_task(1, "a", false)).await.unwrap();
        let second = store.insert_task(new_task(1, "b", false)).await.unwrap();
        assert!(store.delete_task(second.id).await.unwrap());
        let third = store.insert_task(new_task(1, "c", false)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_list_filters_owner_and_prefix() {
        let store = MemoryStore::new();
        store.insert_task(new_task(1, "Buy milk", false)).await.unwrap();
        store.insert_task(new_task(1, "Call mom", true)).await.unwrap();
        store.insert_task(new_task(2, "Buy bread", false)).await.unwrap();

        let all = store.list_tasks_by_owner(1, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let buy = store.list_tasks_by_owner(1, Some("Buy")).await.unwrap();
        assert_eq!(buy.len(), 1);
        assert_eq!(buy[0].title, "Buy milk");

        let lower = store.list_tasks_by_owner(1, Some("buy")).await.unwrap();
        assert!(lower.is_empty());

        assert_eq!(store.count_incomplete_by_owner(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_preserves_owner_and_created_at() {
        let store = MemoryStore::new();
        let task = store.insert_task(new_task(1, "Old", false)).await.unwrap();

        let updated = store
            .update_task(
                task.id,
                UpdateTask {
                    title: "New".to_string(),
                    description: Some("details".to_string()),
                    complete: true,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.owner_id, task.owner_id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.title, "New");
        assert!(updated.complete);

        let missing = store
            .update_task(
                999,
                UpdateTask {
                    title: "x".to_string(),
                    description: None,
                    complete: false,
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store
            .insert_session(CreateSession {
                user_id: 1,
                token_hash: "a".repeat(64),
                expires_at: now - Duration::minutes(1),
            })
            .await
            .unwrap();
        let live = store
            .insert_session(CreateSession {
                user_id: 1,
                token_hash: "b".repeat(64),
                expires_at: now + Duration::hours(1),
            })
            .await
            .unwrap();

        assert_eq!(store.delete_expired_sessions(now).await.unwrap(), 1);
        let remaining = store
            .find_session_by_token_hash(&live.token_hash)
            .await
            .unwrap();
        assert_eq!(remaining.map(|s| s.id), Some(live.id));
    }
}
