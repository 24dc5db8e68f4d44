/// Table records for Taskboard
///
/// This module contains the hosted tables, their typed rows and the DTOs used
/// to create and update them.
///
/// # Models
///
/// - `task`: Personal tasks owned by a user
/// - `user_data`: Opaque per-user JSON payloads
///
/// # Tables
///
/// Tables are identified by the [`Table`] enum rather than free-form strings,
/// so a cache key or a request path can never name a table that does not exist.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::{Record, Table};
/// use taskboard_shared::models::task::Task;
///
/// assert_eq!(Task::TABLE, Table::Tasks);
/// assert_eq!(Table::Tasks.name(), "tasks");
/// ```

pub mod task;
pub mod user_data;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Hosted tables known to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// `tasks(id, created_at, user_id, task_name, task_description)`
    Tasks,

    /// `user_data(id, created_at, user_data)`
    UserData,
}

impl Table {
    /// Every table, in a stable order
    pub const ALL: [Table; 2] = [Table::Tasks, Table::UserData];

    /// Table name as used in the REST path
    pub fn name(&self) -> &'static str {
        match self {
            Table::Tasks => "tasks",
            Table::UserData => "user_data",
        }
    }

    /// Column naming the owning user, for tables with per-user rows
    pub fn owner_column(&self) -> Option<&'static str> {
        match self {
            Table::Tasks => Some("user_id"),
            Table::UserData => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row type stored in one hosted table
///
/// Ties the row to its table and to the DTOs accepted for inserts and
/// updates. Both DTOs are validated before any remote call.
pub trait Record: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table holding this record
    const TABLE: Table;

    /// Insert payload (no id, no created_at)
    type New: Serialize + Validate + Send + Sync;

    /// Update payload (only the fields to change)
    type Changes: Serialize + Validate + Send + Sync;

    /// Server-assigned identifier
    fn id(&self) -> i64;
}
