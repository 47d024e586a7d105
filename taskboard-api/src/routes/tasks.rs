/// Task endpoints
///
/// Every route here sits behind `require_session` and receives the caller's
/// `AuthContext` as an extension.
///
/// # Endpoints
///
/// - `GET  /`                  - Caller's tasks, `?search-area=<prefix>`
/// - `GET  /task/:id`          - Task detail (any signed-in user)
/// - `GET  /task-create`       - Empty task form
/// - `POST /task-create`       - Create, redirect to `/`
/// - `GET  /task-update/:id`   - Prefilled task form (owner only)
/// - `POST /task-update/:id`   - Update, redirect to `/` (owner only)
/// - `GET  /task-delete/:id`   - Delete confirmation (owner only)
/// - `POST /task-delete/:id`   - Delete, redirect to `/` (owner only)
///
/// `:id` must be a positive integer; anything else is a 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiForm, ApiQuery},
    routes::auth::HOME_PATH,
};
use axum::{
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    response::Redirect,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::session::AuthContext,
    models::task::Task,
    tasks::{self, TaskInput, TaskListing},
};

const TASK_FIELDS: &[&str] = &["title", "description", "complete"];

/// Task ID from the URL path
///
/// Rejects anything but a positive integer with 404, the same as an
/// unknown ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for TaskId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;

        parse_task_id(&raw).map(TaskId).ok_or_else(not_found)
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

fn parse_task_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

/// Whether a checkbox value means "checked"
///
/// Browsers omit unchecked boxes entirely; an explicit `false`, `off`, `0`
/// or empty value is also treated as unchecked.
fn checkbox(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "off" | "0"
        ),
    }
}

/// List query string
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Title prefix
    #[serde(rename = "search-area", default)]
    pub search_area: String,
}

/// Submitted task form
///
/// Unknown fields (an `owner` or `user` for instance) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub complete: Option<String>,
}

impl From<TaskForm> for TaskInput {
    fn from(form: TaskForm) -> Self {
        TaskInput {
            complete: checkbox(form.complete.as_deref()),
            title: form.title,
            description: form.description,
        }
    }
}

/// Task list page
#[derive(Debug, Serialize)]
pub struct TaskListPage {
    /// Signed-in user's name
    pub username: String,

    #[serde(flatten)]
    pub listing: TaskListing,
}

/// Single task page
#[derive(Debug, Serialize)]
pub struct TaskPage {
    pub page: &'static str,
    pub task: Task,
}

/// Create/update form page
#[derive(Debug, Serialize)]
pub struct TaskFormPage {
    pub page: &'static str,

    /// Where the form posts to
    pub action: String,

    pub fields: &'static [&'static str],

    /// Current values when editing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
}

/// Delete confirmation page
#[derive(Debug, Serialize)]
pub struct DeletePage {
    pub page: &'static str,
    pub action: String,
    pub task: Task,
}

/// Caller's tasks, optionally filtered by title prefix
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<TaskListPage>> {
    let listing = tasks::list_tasks(state.store.as_ref(), &auth, &query.search_area).await?;

    Ok(Json(TaskListPage {
        username: auth.username,
        listing,
    }))
}

/// Task detail
pub async fn task_detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    TaskId(id): TaskId,
) -> ApiResult<Json<TaskPage>> {
    let task = tasks::read_task(state.store.as_ref(), &auth, id).await?;

    Ok(Json(TaskPage {
        page: "task",
        task,
    }))
}

/// Empty create form
pub async fn create_page(Extension(_auth): Extension<AuthContext>) -> Json<TaskFormPage> {
    Json(TaskFormPage {
        page: "task-create",
        action: "/task-create".to_string(),
        fields: TASK_FIELDS,
        task: None,
    })
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing or too-long title, or a NUL
///   character in the title or description
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiForm(form): ApiForm<TaskForm>,
) -> ApiResult<Redirect> {
    tasks::create_task(state.store.as_ref(), &auth, form.into()).await?;

    Ok(Redirect::to(HOME_PATH))
}

/// Prefilled update form
pub async fn update_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    TaskId(id): TaskId,
) -> ApiResult<Json<TaskFormPage>> {
    let task = tasks::owned_task(state.store.as_ref(), &auth, id).await?;

    Ok(Json(TaskFormPage {
        page: "task-update",
        action: format!("/task-update/{}", id),
        fields: TASK_FIELDS,
        task: Some(task),
    }))
}

/// Replace a task's title, description and completion flag
///
/// # Errors
///
/// - `403 Forbidden`: Caller doesn't own the task
/// - `404 Not Found`: Unknown task
/// - `422 Unprocessable Entity`: Missing or too-long title
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    TaskId(id): TaskId,
    ApiForm(form): ApiForm<TaskForm>,
) -> ApiResult<Redirect> {
    tasks::update_task(state.store.as_ref(), &auth, id, form.into()).await?;

    Ok(Redirect::to(HOME_PATH))
}

/// Delete confirmation
pub async fn delete_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    TaskId(id): TaskId,
) -> ApiResult<Json<DeletePage>> {
    let task = tasks::owned_task(state.store.as_ref(), &auth, id).await?;

    Ok(Json(DeletePage {
        page: "task-delete",
        action: format!("/task-delete/{}", id),
        task,
    }))
}

/// Delete a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller doesn't own the task
/// - `404 Not Found`: Unknown task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    TaskId(id): TaskId,
) -> ApiResult<Redirect> {
    tasks::delete_task(state.store.as_ref(), &auth, id).await?;

    Ok(Redirect::to(HOME_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_id() {
        assert_eq!(parse_task_id("1"), Some(1));
        assert_eq!(parse_task_id("42"), Some(42));
        assert_eq!(parse_task_id("0"), None);
        assert_eq!(parse_task_id("-1"), None);
        assert_eq!(parse_task_id("+1"), None);
        assert_eq!(parse_task_id("abc"), None);
        assert_eq!(parse_task_id("1.5"), None);
        assert_eq!(parse_task_id(""), None);
        assert_eq!(parse_task_id("99999999999999999999"), None);
    }

    #[test]
    fn test_checkbox() {
        assert!(!checkbox(None));
        assert!(!checkbox(Some("")));
        assert!(!checkbox(Some("false")));
        assert!(!checkbox(Some("OFF")));
        assert!(!checkbox(Some("0")));
        assert!(checkbox(Some("on")));
        assert!(checkbox(Some("true")));
        assert!(checkbox(Some("1")));
    }

    #[test]
    fn test_task_form_into_input() {
        let form = TaskForm {
            title: "Buy milk".to_string(),
            description: Some("2 litres".to_string()),
            complete: Some("on".to_string()),
        };

        let input: TaskInput = form.into();
        assert_eq!(input.title, "Buy milk");
        assert_eq!(input.description.as_deref(), Some("2 litres"));
        assert!(input.complete);

        let input: TaskInput = TaskForm::default().into();
        assert!(!input.complete);
    }
}
