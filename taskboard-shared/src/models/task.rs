/// Task model and DTOs
///
/// A task is a flat row owned by the user who created it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     user_id UUID REFERENCES auth.users(id),
///     task_name TEXT NOT NULL,
///     task_description TEXT
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskboard_shared::models::task::{NewTask, TaskChanges};
/// use uuid::Uuid;
/// use validator::Validate;
///
/// let new_task = NewTask::new(Uuid::new_v4(), "  Buy milk ", "");
/// assert_eq!(new_task.task_name, "Buy milk");
/// assert!(new_task.task_description.is_none());
/// assert!(new_task.validate().is_ok());
///
/// let rename = TaskChanges::rename("Buy oat milk");
/// assert!(rename.validate().is_ok());
/// ```

use super::{Record, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Maximum task name length
pub const MAX_NAME_LEN: u64 = 255;

/// Maximum task description length
pub const MAX_DESCRIPTION_LEN: u64 = 2000;

/// Task row as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned id
    pub id: i64,

    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,

    /// Owner (set at creation from the active session)
    #[serde(default)]
    pub user_id: Option<Uuid>,

    /// Task name
    pub task_name: String,

    /// Free-form description
    #[serde(default)]
    pub task_description: Option<String>,
}

impl Task {
    /// Description, or empty when unset
    pub fn description(&self) -> &str {
        self.task_description.as_deref().unwrap_or("")
    }

    /// Checks whether the task belongs to `user_id`
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

impl Record for Task {
    const TABLE: Table = Table::Tasks;
    type New = NewTask;
    type Changes = TaskChanges;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Insert payload for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTask {
    /// Owner
    pub user_id: Uuid,

    /// Task name (required)
    #[validate(length(min = 1, max = 255, message = "Task name must be 1-255 characters"))]
    pub task_name: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub task_description: Option<String>,
}

impl NewTask {
    /// Builds an insert payload from raw form input
    ///
    /// Trims both fields; an empty description becomes `None`.
    pub fn new(user_id: Uuid, task_name: &str, task_description: &str) -> Self {
        Self {
            user_id,
            task_name: task_name.trim().to_string(),
            task_description: non_empty(task_description),
        }
    }
}

/// Update payload for a task
///
/// Only present fields are sent. `user_id` is absent: ownership
/// never changes after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_has_changes"))]
pub struct TaskChanges {
    /// New name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Task name must be 1-255 characters"))]
    pub task_name: Option<String>,

    /// New description (empty string clears it)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub task_description: Option<String>,
}

impl TaskChanges {
    /// Builds a change set from an edit form that submits both fields
    pub fn from_form(task_name: &str, task_description: &str) -> Self {
        Self {
            task_name: Some(task_name.trim().to_string()),
            task_description: Some(task_description.trim().to_string()),
        }
    }

    /// Change set touching only the name
    pub fn rename(task_name: &str) -> Self {
        Self {
            task_name: Some(task_name.trim().to_string()),
            task_description: None,
        }
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.task_name.is_none() && self.task_description.is_none()
    }
}

fn validate_has_changes(changes: &TaskChanges) -> Result<(), ValidationError> {
    if changes.is_empty() {
        let mut err = ValidationError::new("empty_changes");
        err.message = Some("At least one field must change".into());
        return Err(err);
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
