/// Typed data access layer
///
/// [`Database`] combines a [`TableStore`] transport, a [`QueryCache`] and the
/// signed-in user's access token. [`Repository`] exposes the four operations
/// of one table with typed records:
///
/// - `list()`: all rows, served from the cache when populated
/// - `create(new)`: validate, insert, invalidate
/// - `update(id, changes)`: validate, update by id, invalidate
/// - `delete(id)`: delete by id, invalidate
///
/// A `Database` is built once per signed-in session and dropped at sign-out;
/// nothing here is global. A client built with [`Database::with_owner`] scopes
/// updates and deletes on per-user tables to that user's rows: another
/// user's row behaves as if it did not exist.
///
/// # Errors
///
/// DTOs are validated before submission ([`DataError::Invalid`]). Backend
/// failures surface as [`DataError::Remote`] carrying the unchanged
/// [`RemoteError`]. A failed write leaves the cache untouched.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::database::Database;
/// use taskboard_shared::models::task::{NewTask, TaskChanges};
/// use taskboard_shared::remote::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::new(Arc::new(MemoryStore::new()));
/// let tasks = db.tasks();
///
/// let task = tasks.create(&NewTask::new(Uuid::new_v4(), "A", "x")).await?.unwrap();
/// tasks.update(task.id, &TaskChanges::rename("B")).await?;
/// assert_eq!(tasks.list().await?[0].task_name, "B");
///
/// tasks.delete(task.id).await?;
/// assert!(tasks.list().await?.is_empty());
/// # Ok(())
/// # }
/// ```

use crate::{
    cache::{Lookup, QueryCache},
    error::RemoteError,
    models::{task::Task, user_data::UserData, Record, Table},
    remote::{RowFilter, TableStore},
};
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Data access errors
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Payload rejected before submission
    #[error("Invalid {table} record: {}", describe_validation(.errors))]
    Invalid {
        /// Target table
        table: Table,

        /// Field errors
        errors: ValidationErrors,
    },

    /// Backend call failed
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl DataError {
    /// Backend error, if this is one
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            DataError::Remote(err) => Some(err),
            DataError::Invalid { .. } => None,
        }
    }
}

/// Data access result type alias
pub type DataResult<T> = Result<T, DataError>;

/// Flattens validation errors into `(field, message)` pairs, sorted by field
///
/// Struct-level errors are reported under `__all__`.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut messages: Vec<(String, String)> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                (
                    field.to_string(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                )
            })
        })
        .collect();

    messages.sort();
    messages
}

fn describe_validation(errors: &ValidationErrors) -> String {
    validation_messages(errors)
        .into_iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Data access client for one session
pub struct Database {
    store: Arc<dyn TableStore>,
    cache: QueryCache,
    access_token: RwLock<Option<String>>,
    owner: Option<Uuid>,
}

impl Database {
    /// Creates a client authenticating with the project key only
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            cache: QueryCache::new(),
            access_token: RwLock::new(None),
            owner: None,
        }
    }

    /// Creates a client acting as the user owning `access_token`
    pub fn with_access_token(store: Arc<dyn TableStore>, access_token: impl Into<String>) -> Self {
        Self {
            store,
            cache: QueryCache::new(),
            access_token: RwLock::new(Some(access_token.into())),
            owner: None,
        }
    }

    /// Restricts writes on per-user tables to rows owned by `owner`
    pub fn with_owner(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }

    /// User whose rows this client may change, if scoped
    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    /// Replaces the bearer token (after a session refresh)
    pub async fn set_access_token(&self, access_token: Option<String>) {
        *self.access_token.write().await = access_token;
    }

    /// Read cache of this client
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Underlying transport
    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Repository for any record type
    pub fn repository<R: Record>(&self) -> Repository<'_, R> {
        Repository {
            db: self,
            _record: PhantomData,
        }
    }

    /// `tasks` repository
    pub fn tasks(&self) -> Repository<'_, Task> {
        self.repository()
    }

    /// `user_data` repository
    pub fn user_data(&self) -> Repository<'_, UserData> {
        self.repository()
    }

    async fn token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    fn filter(&self, id: i64) -> RowFilter {
        match self.owner {
            Some(owner) => RowFilter::id(id).owned_by(owner),
            None => RowFilter::id(id),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

/// Typed operations on one table
pub struct Repository<'a, R> {
    db: &'a Database,
    _record: PhantomData<R>,
}

impl<'a, R: Record> Repository<'a, R> {
    /// Returns every row, from the cache when populated
    ///
    /// # Errors
    ///
    /// `DataError::Remote` when the backend call fails or a row does not
    /// decode. Nothing is cached in that case.
    pub async fn list(&self) -> DataResult<Vec<R>> {
        let table = R::TABLE;

        let generation = match self.db.cache.lookup(table).await {
            Lookup::Hit(rows) => {
                tracing::debug!(%table, rows = rows.len(), "cache hit");
                return Ok(decode_rows(&rows)?);
            }
            Lookup::Miss { generation } => generation,
        };

        tracing::debug!(%table, "cache miss, fetching");
        let token = self.db.token().await;
        let rows = self.db.store.select_all(table, token.as_deref()).await?;

        // Decode before caching so an undecodable set is never served later
        let records = decode_rows(&rows)?;
        self.db.cache.populate(table, generation, rows).await;

        Ok(records)
    }

    /// Inserts a record and returns it with its server-assigned fields
    ///
    /// `Ok(None)` means the insert landed but the backend sent no
    /// representation back (a 204 answer).
    ///
    /// # Errors
    ///
    /// - `DataError::Invalid` if `new` fails validation (nothing is sent)
    /// - `DataError::Remote` on constraint violation or transport failure
    pub async fn create(&self, new: &R::New) -> DataResult<Option<R>> {
        let table = R::TABLE;
        validate(table, new)?;

        let row = serde_json::to_value(new).map_err(RemoteError::from)?;
        let token = self.db.token().await;
        let rows = self.db.store.insert(table, row, token.as_deref()).await?;

        self.db.cache.invalidate(table).await;
        tracing::info!(%table, "record created");

        match rows.first() {
            Some(row) => Ok(Some(decode_row(row)?)),
            None => {
                tracing::debug!(%table, "insert returned no representation");
                Ok(None)
            }
        }
    }

    /// Applies `changes` to the row with `id`
    ///
    /// # Errors
    ///
    /// - `DataError::Invalid` if `changes` fails validation (nothing is sent)
    /// - `DataError::Remote` if no row has `id` or the call fails
    pub async fn update(&self, id: i64, changes: &R::Changes) -> DataResult<R> {
        let table = R::TABLE;
        validate(table, changes)?;

        let changes = serde_json::to_value(changes).map_err(RemoteError::from)?;
        let token = self.db.token().await;
        let rows = self
            .db
            .store
            .update(table, self.db.filter(id), changes, token.as_deref())
            .await?;

        let row = rows.first().ok_or_else(|| {
            RemoteError::new(format!("No {} row with id {}", table, id)).with_status(404)
        })?;

        self.db.cache.invalidate(table).await;
        tracing::info!(%table, id, "record updated");

        Ok(decode_row(row)?)
    }

    /// Deletes the row with `id`
    ///
    /// Deleting an id that does not exist succeeds, as it does on the backend.
    pub async fn delete(&self, id: i64) -> DataResult<()> {
        let table = R::TABLE;
        let token = self.db.token().await;
        let removed = self
            .db
            .store
            .delete(table, self.db.filter(id), token.as_deref()).await?;

        self.db.cache.invalidate(table).await;
        tracing::info!(%table, id, removed = removed.len(), "record deleted");

        Ok(())
    }
}

fn validate<T: Validate>(table: Table, payload: &T) -> DataResult<()> {
    payload
        .validate()
        .map_err(|errors| DataError::Invalid { table, errors })
}

fn decode_row<R: Record>(row: &JsonValue) -> Result<R, RemoteError> {
    Ok(R::deserialize(row)?)
}

fn decode_rows<R: Record>(rows: &[JsonValue]) -> Result<Vec<R>, RemoteError> {
    rows.iter().map(decode_row).collect()
}
