/// In-memory table transport
///
/// Behaves like the hosted backend for the four operations the application
/// uses, without any network:
///
/// - ids are assigned from a per-table sequence starting at 1
/// - `created_at` is set to the insert time (RFC 3339)
/// - updates and deletes that match nothing return an empty row set
/// - an owner in the [`RowFilter`] restricts writes to that user's rows, the
///   way row-level security does on the backend
///
/// It also records how many calls each table received and can be told to fail
/// the next call on a table, which makes cache behavior and error paths
/// observable in tests. The web server uses it in offline mode.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::Table;
/// use taskboard_shared::remote::{MemoryStore, TableStore};
/// use taskboard_shared::remote::memory::Operation;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.insert(Table::Tasks, json!({"task_name": "A"}), None).await?;
///
/// let rows = store.select_all(Table::Tasks, None).await?;
/// assert_eq!(rows[0]["id"], 1);
/// assert_eq!(store.calls(Table::Tasks, Operation::Select).await, 1);
/// # Ok(())
/// # }
/// ```

use super::{RowFilter, TableStore};
use crate::{
    error::{RemoteError, RemoteResult},
    models::Table,
};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Operation kinds counted by [`MemoryStore::calls`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `select_all`
    Select,

    /// `insert`
    Insert,

    /// `update`
    Update,

    /// `delete`
    Delete,
}

#[derive(Debug)]
struct MemoryTable {
    next_id: i64,
    rows: Vec<Map<String, JsonValue>>,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<Table, MemoryTable>,
    calls: HashMap<(Table, Operation), usize>,
    failures: HashMap<Table, RemoteError>,
}

/// Table transport keeping rows in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `operation` calls `table` has received
    pub async fn calls(&self, table: Table, operation: Operation) -> usize {
        let state = self.state.lock().await;
        state.calls.get(&(table, operation)).copied().unwrap_or(0)
    }

    /// Makes the next call on `table` fail with `error`
    pub async fn fail_next(&self, table: Table, error: RemoteError) {
        let mut state = self.state.lock().await;
        state.failures.insert(table, error);
    }

    /// Current rows of `table`, bypassing call accounting
    pub async fn snapshot(&self, table: Table) -> Vec<JsonValue> {
        let state = self.state.lock().await;
        state
            .tables
            .get(&table)
            .map(|t| t.rows.iter().cloned().map(JsonValue::Object).collect())
            .unwrap_or_default()
    }

    /// Records the call and returns the injected failure, if any
    fn begin(state: &mut State, table: Table, operation: Operation) -> RemoteResult<()> {
        *state.calls.entry((table, operation)).or_insert(0) += 1;

        match state.failures.remove(&table) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn row_id(row: &Map<String, JsonValue>) -> Option<i64> {
    row.get("id").and_then(JsonValue::as_i64)
}

fn matches(row: &Map<String, JsonValue>, table: Table, filter: &RowFilter) -> bool {
    if row_id(row) != Some(filter.id) {
        return false;
    }

    match filter.owner_condition(table) {
        Some((column, owner)) => {
            row.get(column)
                .and_then(JsonValue::as_str)
                .and_then(|value| Uuid::parse_str(value).ok())
                == Some(owner)
        }
        None => true,
    }
}

fn into_object(value: JsonValue) -> RemoteResult<Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(RemoteError::new(format!(
            "Expected a JSON object, got {}",
            other
        ))
        .with_status(400)
        .with_code("PGRST102")),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn select_all(
        &self,
        table: Table,
        _access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        let mut state = self.state.lock().await;
        Self::begin(&mut state, table, Operation::Select)?;

        Ok(state
            .tables
            .get(&table)
            .map(|t| t.rows.iter().cloned().map(JsonValue::Object).collect())
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        table: Table,
        row: JsonValue,
        _access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        let mut state = self.state.lock().await;
        Self::begin(&mut state, table, Operation::Insert)?;

        let mut row = into_object(row)?;
        let memory_table = state.tables.entry(table).or_default();

        let id = memory_table.next_id;
        memory_table.next_id += 1;

        row.insert("id".to_string(), JsonValue::from(id));
        row.insert(
            "created_at".to_string(),
            JsonValue::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        memory_table.rows.push(row.clone());

        Ok(vec![JsonValue::Object(row)])
    }

    async fn update(
        &self,
        table: Table,
        filter: RowFilter,
        changes: JsonValue,
        _access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        let mut state = self.state.lock().await;
        Self::begin(&mut state, table, Operation::Update)?;

        let changes = into_object(changes)?;
        let mut updated = Vec::new();

        if let Some(memory_table) = state.tables.get_mut(&table) {
            for row in memory_table.rows.iter_mut().filter(|r| matches(r, table, &filter)) {
                for (key, value) in &changes {
                    if key != "id" && key != "created_at" {
                        row.insert(key.clone(), value.clone());
                    }
                }
                updated.push(JsonValue::Object(row.clone()));
            }
        }

        Ok(updated)
    }

    async fn delete(
        &self,
        table: Table,
        filter: RowFilter,
        _access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        let mut state = self.state.lock().await;
        Self::begin(&mut state, table, Operation::Delete)?;

        let mut removed = Vec::new();
        if let Some(memory_table) = state.tables.get_mut(&table) {
            let (gone, kept): (Vec<_>, Vec<_>) = memory_table
                .rows
                .drain(..)
                .partition(|r| matches(r, table, &filter));
            memory_table.rows = kept;
            removed.extend(gone.into_iter().map(JsonValue::Object));
        }

        Ok(removed)
    }

    async fn ping(&self) -> RemoteResult<()> {
        Ok(())
    }
}
