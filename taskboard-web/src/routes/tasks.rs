/// Dashboard and task forms
///
/// # Endpoints
///
/// - `GET /` - Dashboard
/// - `POST /tasks` - Create a task
/// - `GET /tasks/:id/edit` - Dashboard with the edit form for one task
/// - `POST /tasks/:id` - Update a task
/// - `POST /tasks/:id/delete` - Delete a task
///
/// All routes sit behind the page session guard. Writes redirect back to the
/// dashboard with a flash message stating the outcome, so a failed write is
/// never mistaken for a successful one.

use super::own_tasks;
use crate::{
    error::{ApiError, ApiResult},
    session::{self, CurrentUser, Flash},
    views::{self, dashboard::Dashboard},
};
use axum::{
    extract::Path,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use taskboard_shared::{
    models::task::{NewTask, Task, TaskChanges},
    DataError,
};
use tower_sessions::Session;

/// Create and edit form
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    /// Task name
    #[serde(default)]
    pub task_name: String,

    /// Task description
    #[serde(default)]
    pub task_description: String,
}

/// Renders the dashboard
pub async fn dashboard(
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> ApiResult<Html<String>> {
    let flash = session::take_flash(&session).await?;
    let tasks = load_tasks(&user).await;

    Ok(Html(views::dashboard::render(&Dashboard {
        email: user.email(),
        tasks: tasks.as_deref(),
        editing: None,
        flash: flash.as_ref(),
    })))
}

/// Renders the dashboard with the edit form for task `id`
pub async fn edit_task(
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let tasks = load_tasks(&user).await;

    let editing = match tasks.as_deref() {
        Some(tasks) => match tasks.iter().find(|task| task.id == id) {
            Some(task) => Some(task),
            None => {
                session::set_flash(&session, Flash::error(format!("No task with id {}", id)))
                    .await?;
                return Ok(Redirect::to("/").into_response());
            }
        },
        None => None,
    };

    let flash = session::take_flash(&session).await?;

    Ok(Html(views::dashboard::render(&Dashboard {
        email: user.email(),
        tasks: tasks.as_deref(),
        editing,
        flash: flash.as_ref(),
    }))
    .into_response())
}

/// Creates a task owned by the signed-in user
pub async fn create_task(
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Form(form): Form<TaskForm>,
) -> ApiResult<Redirect> {
    let new_task = NewTask::new(user.id(), &form.task_name, &form.task_description);
    let result = user.db.tasks().create(&new_task).await;

    report(&session, result.map(|_| "Task created")).await?;
    Ok(Redirect::to("/"))
}

/// Updates name and description of task `id`
pub async fn update_task(
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<TaskForm>,
) -> ApiResult<Redirect> {
    let changes = TaskChanges::from_form(&form.task_name, &form.task_description);
    let result = user.db.tasks().update(id, &changes).await;

    report(&session, result.map(|_| "Task updated")).await?;
    Ok(Redirect::to("/"))
}

/// Deletes task `id`
pub async fn delete_task(
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    let result = user.db.tasks().delete(id).await;

    report(&session, result.map(|_| "Task deleted")).await?;
    Ok(Redirect::to("/"))
}

/// Reads the user's tasks, or `None` when the read failed
async fn load_tasks(user: &CurrentUser) -> Option<Vec<Task>> {
    match user.db.tasks().list().await {
        Ok(tasks) => Some(own_tasks(tasks, user.id())),
        Err(err) => {
            tracing::warn!(user_id = %user.id(), "Failed to load tasks: {}", err);
            None
        }
    }
}

/// Turns a write outcome into a flash message
async fn report(session: &Session, result: Result<&'static str, DataError>) -> ApiResult<()> {
    let flash = match result {
        Ok(message) => Flash::success(message),
        Err(err) => {
            tracing::warn!("Task write failed: {}", err);
            Flash::error(ApiError::from(err).user_message())
        }
    };

    session::set_flash(session, flash).await
}
