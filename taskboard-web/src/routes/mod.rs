/// Route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login page, sign-in, sign-up and logout
/// - `tasks`: Dashboard and task forms
/// - `api`: JSON endpoints for tasks and user data

pub mod api;
pub mod auth;
pub mod health;
pub mod tasks;

use taskboard_shared::models::task::Task;
use uuid::Uuid;

/// Keeps the rows owned by `user_id`
///
/// The hosted backend already scopes rows to the caller; offline tables are
/// shared by every account.
pub(crate) fn own_tasks(tasks: Vec<Task>, user_id: Uuid) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| task.is_owned_by(user_id))
        .collect()
}
