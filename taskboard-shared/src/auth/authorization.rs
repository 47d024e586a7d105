/// Ownership checks
///
/// Tasks are private to their owner for every mutation. Reads of a single
/// task are deliberately not restricted; see [`crate::tasks::read_task`].

use super::session::AuthContext;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller doesn't own the task
    #[error("User {user_id} does not own task {task_id}")]
    NotOwner { user_id: i64, task_id: i64 },
}

/// Checks that the caller owns `task`
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use taskboard_shared::auth::{authorization::require_owner, session::AuthContext};
/// use taskboard_shared::models::task::Task;
///
/// let task = Task {
///     id: 1,
///     owner_id: 10,
///     title: "Buy milk".to_string(),
///     description: None,
///     complete: false,
///     created_at: Utc::now(),
/// };
/// let owner = AuthContext { user_id: 10, username: "alice".to_string(), session_id: 1 };
/// let other = AuthContext { user_id: 11, username: "bob".to_string(), session_id: 2 };
///
/// assert!(require_owner(&owner, &task).is_ok());
/// assert!(require_owner(&other, &task).is_err());
/// ```
pub fn require_owner(auth: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    if task.owner_id != auth.user_id {
        return Err(AuthzError::NotOwner {
            user_id: auth.user_id,
            task_id: task.id,
        });
    }

    Ok(())
}
