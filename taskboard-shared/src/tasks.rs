/// Task operations scoped to the authenticated caller
///
/// Every operation takes the store and the caller's [`AuthContext`]
/// explicitly. The owner of a new task always comes from the caller, never
/// from client input.
///
/// | Operation | Ownership |
/// |---|---|
/// | [`list_tasks`] | only the caller's tasks |
/// | [`read_task`] | any task (any authenticated caller) |
/// | [`owned_task`], [`update_task`], [`delete_task`] | owner only |
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::session::AuthContext;
/// use taskboard_shared::store::memory::MemoryStore;
/// use taskboard_shared::tasks::{create_task, list_tasks, TaskInput};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let alice = AuthContext { user_id: 1, username: "alice".to_string(), session_id: 1 };
///
/// create_task(&store, &alice, TaskInput::titled("Buy milk")).await?;
///
/// let listing = list_tasks(&store, &alice, "Buy").await?;
/// assert_eq!(listing.tasks.len(), 1);
/// assert_eq!(listing.incomplete_count, 1);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::authorization::require_owner;
use crate::auth::session::AuthContext;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::store::{StoreError, TaskStore};
use crate::validation::{field_errors, FieldError};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// No task with this ID
    #[error("Task {0} not found")]
    NotFound(i64),

    /// Task exists but belongs to someone else
    #[error("Task {0} belongs to another user")]
    Forbidden(i64),

    /// Submitted form is invalid
    #[error("Invalid task: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

const NUL_MESSAGE: &str = "Null characters are not allowed.";

/// Submitted task form, used for both create and update
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct TaskInput {
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    pub title: String,

    pub description: Option<String>,

    pub complete: bool,
}

impl TaskInput {
    /// Incomplete task with only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Trims the title, drops a blank description, and validates
    fn clean(self) -> Result<Self, TaskError> {
        let cleaned = Self {
            title: self.title.trim().to_string(),
            description: self
                .description
                .filter(|d| !d.trim().is_empty()),
            complete: self.complete,
        };

        let mut errors = match cleaned.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };
        if cleaned.title.is_empty() {
            errors.insert(0, FieldError::new("title", "This field is required."));
        }
        if cleaned.title.contains('\0') {
            errors.push(FieldError::new("title", NUL_MESSAGE));
        }
        if cleaned.description.as_deref().is_some_and(|d| d.contains('\0')) {
            errors.push(FieldError::new("description", NUL_MESSAGE));
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(TaskError::Validation(errors))
        }
    }
}

/// Result of [`list_tasks`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListing {
    /// Caller's tasks matching the search, in ID order
    pub tasks: Vec<Task>,

    /// Caller's incomplete tasks, ignoring the search
    pub incomplete_count: i64,

    /// The search prefix, echoed back for the search box
    pub search_input: String,
}

/// Lists the caller's tasks, optionally narrowed by a title prefix
///
/// An empty `search_prefix` returns all of the caller's tasks. Prefix
/// matching is case-sensitive. `incomplete_count` always covers every task
/// the caller owns, not just the matching ones. A prefix containing NUL
/// matches nothing, since no stored title can contain one.
pub async fn list_tasks<S>(
    store: &S,
    caller: &AuthContext,
    search_prefix: &str,
) -> Result<TaskListing, TaskError>
where
    S: TaskStore + ?Sized,
{
    let prefix = (!search_prefix.is_empty()).then_some(search_prefix);

    let tasks = match prefix {
        Some(p) if p.contains('\0') => Vec::new(),
        _ => store.list_tasks_by_owner(caller.user_id, prefix).await?,
    };
    let incomplete_count = store.count_incomplete_by_owner(caller.user_id).await?;

    Ok(TaskListing {
        tasks,
        incomplete_count,
        search_input: search_prefix.to_string(),
    })
}

/// Creates a task owned by the caller
pub async fn create_task<S>(
    store: &S,
    caller: &AuthContext,
    input: TaskInput,
) -> Result<Task, TaskError>
where
    S: TaskStore + ?Sized,
{
    let input = input.clean()?;

    let task = store
        .insert_task(CreateTask {
            owner_id: caller.user_id,
            title: input.title,
            description: input.description,
            complete: input.complete,
        })
        .await?;

    info!(task_id = task.id, owner_id = task.owner_id, "Task created");
    Ok(task)
}

/// Fetches any task by ID
///
/// Not restricted to the owner: any authenticated user may view a task's
/// detail page.
pub async fn read_task<S>(store: &S, _caller: &AuthContext, id: i64) -> Result<Task, TaskError>
where
    S: TaskStore + ?Sized,
{
    store.find_task(id).await?.ok_or(TaskError::NotFound(id))
}

/// Fetches a task the caller owns
///
/// Backs the update and delete pages, which must not reveal another user's
/// task for editing.
pub async fn owned_task<S>(store: &S, caller: &AuthContext, id: i64) -> Result<Task, TaskError>
where
    S: TaskStore + ?Sized,
{
    let task = store.find_task(id).await?.ok_or(TaskError::NotFound(id))?;

    require_owner(caller, &task).map_err(|e| {
        warn!(user_id = caller.user_id, task_id = id, "{}", e);
        TaskError::Forbidden(id)
    })?;

    Ok(task)
}

/// Replaces a task's title, description and completion flag
pub async fn update_task<S>(
    store: &S,
    caller: &AuthContext,
    id: i64,
    input: TaskInput,
) -> Result<Task, TaskError>
where
    S: TaskStore + ?Sized,
{
    owned_task(store, caller, id).await?;
    let input = input.clean()?;

    let task = store
        .update_task(
            id,
            UpdateTask {
                title: input.title,
                description: input.description,
                complete: input.complete,
            },
        )
        .await?
        .ok_or(TaskError::NotFound(id))?;

    info!(task_id = id, complete = task.complete, "Task updated");
    Ok(task)
}

/// Deletes a task the caller owns
pub async fn delete_task<S>(store: &S, caller: &AuthContext, id: i64) -> Result<(), TaskError>
where
    S: TaskStore + ?Sized,
{
    owned_task(store, caller, id).await?;

    if !store.delete_task(id).await? {
        return Err(TaskError::NotFound(id));
    }

    info!(task_id = id, owner_id = caller.user_id, "Task deleted");
    Ok(())
}
