/// JSON API
///
/// The same four operations as the dashboard, over JSON, for both tables.
///
/// # Endpoints
///
/// - `GET /v1/tasks` - List the user's tasks
/// - `POST /v1/tasks` - Create a task (owner taken from the session)
/// - `PATCH /v1/tasks/:id` - Update a task
/// - `DELETE /v1/tasks/:id` - Delete a task
/// - `GET /v1/user-data` - List user data rows
/// - `POST /v1/user-data` - Create a user data row
/// - `PATCH /v1/user-data/:id` - Replace a row's payload
/// - `DELETE /v1/user-data/:id` - Delete a user data row
///
/// Errors use the [`crate::error::ErrorResponse`] body. Backend messages
/// are passed through unchanged. Updates and deletes only reach the caller's
/// own tasks; another user's task id answers like a missing one.
///
/// A create answers `201` with the stored row, or `201` with an empty body
/// when the backend confirmed the insert without returning it.

use super::own_tasks;
use crate::{error::ApiResult, session::CurrentUser};
use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::models::{
    task::{NewTask, Task, TaskChanges},
    user_data::{NewUserData, UserData, UserDataChanges},
};

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Task name
    pub task_name: String,

    /// Optional description
    #[serde(default)]
    pub task_description: Option<String>,
}

/// Lists the signed-in user's tasks
pub async fn list_tasks(Extension(user): Extension<CurrentUser>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = user.db.tasks().list().await?;
    Ok(Json(own_tasks(tasks, user.id())))
}

/// Creates a task
pub async fn create_task(
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Response> {
    let new_task = NewTask::new(
        user.id(),
        &req.task_name,
        req.task_description.as_deref().unwrap_or(""),
    );

    let task = user.db.tasks().create(&new_task).await?;
    Ok(created(task))
}

/// Applies the given fields to task `id`
pub async fn update_task(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<TaskChanges>,
) -> ApiResult<Json<Task>> {
    Ok(Json(user.db.tasks().update(id, &changes).await?))
}

/// Deletes task `id`
pub async fn delete_task(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    user.db.tasks().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists user data rows
pub async fn list_user_data(
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<UserData>>> {
    Ok(Json(user.db.user_data().list().await?))
}

/// Creates a user data row
pub async fn create_user_data(
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<NewUserData>,
) -> ApiResult<Response> {
    let row = user.db.user_data().create(&req).await?;
    Ok(created(row))
}

/// Replaces the payload of row `id`
pub async fn update_user_data(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<UserDataChanges>,
) -> ApiResult<Json<UserData>> {
    Ok(Json(user.db.user_data().update(id, &changes).await?))
}

/// Deletes row `id`
pub async fn delete_user_data(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    user.db.user_data().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn created<T: Serialize>(row: Option<T>) -> Response {
    match row {
        Some(row) => (StatusCode::CREATED, Json(row)).into_response(),
        None => StatusCode::CREATED.into_response(),
    }
}
