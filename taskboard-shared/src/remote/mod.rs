/// Table transports
///
/// A table transport performs the four raw operations the application needs
/// against one hosted table, exchanging untyped JSON rows. Typing, validation
/// and caching live one level up in [`crate::database`].
///
/// # Access Pattern
///
/// ```text
/// select_all  →  select * from {table}
/// insert      →  insert into {table} values [row]
/// update      →  update {table} set {fields} where id = :id [and owner = :user]
/// delete      →  delete from {table} where id = :id [and owner = :user]
/// ```
///
/// Writes return the affected rows, so callers can tell an update that matched
/// nothing from one that succeeded. A [`RowFilter`] carrying an owner only
/// matches rows whose owner column holds that user, so a row belonging to
/// someone else looks exactly like a missing one.
///
/// # Implementations
///
/// - [`PostgrestStore`]: the hosted backend's REST interface
/// - [`MemoryStore`]: in-process tables for offline mode and tests

pub mod memory;
pub mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::{ProjectConfig, PostgrestStore};

use crate::{error::RemoteResult, models::Table};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Rows addressed by an update or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFilter {
    /// Row id
    pub id: i64,

    /// Required owner, checked against [`Table::owner_column`]
    pub owner: Option<Uuid>,
}

impl RowFilter {
    /// Matches the row with `id`
    pub fn id(id: i64) -> Self {
        Self { id, owner: None }
    }

    /// Additionally requires `owner` on tables that have an owner column
    pub fn owned_by(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Owner condition applicable to `table`, as `(column, user)`
    pub fn owner_condition(&self, table: Table) -> Option<(&'static str, Uuid)> {
        Some((table.owner_column()?, self.owner?))
    }
}

/// Raw CRUD access to hosted tables
///
/// `access_token` is the signed-in user's bearer token. When absent the
/// transport authenticates with the project key alone.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Short transport name for logs and health output
    fn name(&self) -> &str;

    /// Returns every row of `table` in backend order
    async fn select_all(
        &self,
        table: Table,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>>;

    /// Inserts one row and returns the stored representation
    async fn insert(
        &self,
        table: Table,
        row: JsonValue,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>>;

    /// Applies `changes` to the rows matching `filter` and returns them
    async fn update(
        &self,
        table: Table,
        filter: RowFilter,
        changes: JsonValue,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>>;

    /// Deletes the rows matching `filter` and returns them
    async fn delete(
        &self,
        table: Table,
        filter: RowFilter,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_condition_only_on_owned_tables() {
        let owner = Uuid::new_v4();
        let filter = RowFilter::id(7).owned_by(owner);

        assert_eq!(filter.owner_condition(Table::Tasks), Some(("user_id", owner)));
        assert_eq!(filter.owner_condition(Table::UserData), None);
        assert_eq!(RowFilter::id(7).owner_condition(Table::Tasks), None);
    }
}
