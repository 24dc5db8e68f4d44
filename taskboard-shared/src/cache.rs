/// Per-table read cache
///
/// Caches the last successful `list()` result of each table and discards it
/// whenever a write to the same table succeeds.
///
/// # State Machine
///
/// ```text
/// empty → populated      (successful list)
/// populated → stale      (successful create/update/delete)
/// stale → empty          (next lookup drops the entry and refetches)
/// ```
///
/// Invalidation is all-or-nothing per table: a single-row update discards the
/// whole cached collection. Tables never invalidate each other.
///
/// # Generations
///
/// Each entry carries a generation counter that every invalidation bumps. A
/// lookup miss hands out the current generation and `populate` refuses rows
/// fetched under an older one, so a read that overlapped a write cannot put
/// pre-write rows back into the cache.
///
/// # Example
///
/// ```
/// use taskboard_shared::cache::{CacheState, Lookup, QueryCache};
/// use taskboard_shared::models::Table;
///
/// # async fn example() {
/// let cache = QueryCache::new();
///
/// let Lookup::Miss { generation } = cache.lookup(Table::Tasks).await else {
///     unreachable!()
/// };
/// cache.populate(Table::Tasks, generation, Vec::new()).await;
/// assert_eq!(cache.state(Table::Tasks).await, CacheState::Populated);
///
/// cache.invalidate(Table::Tasks).await;
/// assert_eq!(cache.state(Table::Tasks).await, CacheState::Stale);
/// # }
/// ```

use crate::models::Table;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cached rows of one table
pub type Rows = Arc<Vec<JsonValue>>;

/// Observable state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing cached; the next read goes to the backend
    Empty,

    /// Rows from the last successful read
    Populated,

    /// Invalidated by a write; dropped on the next lookup
    Stale,
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Cached rows
    Hit(Rows),

    /// No usable rows; fetch and populate under `generation`
    Miss {
        /// Generation the fetch must be stored under
        generation: u64,
    },
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Populated(Rows),
    Stale,
}

#[derive(Debug, Default)]
struct Entry {
    slot: Slot,
    generation: u64,
}

/// Read cache keyed by table
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<Table, Entry>>,
}

impl QueryCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `table`, dropping a stale entry
    pub async fn lookup(&self, table: Table) -> Lookup {
        {
            let entries = self.entries.read().await;
            if let Some(Entry {
                slot: Slot::Populated(rows),
                ..
            }) = entries.get(&table)
            {
                return Lookup::Hit(Arc::clone(rows));
            }
        }

        let mut entries = self.entries.write().await;
        let entry = entries.entry(table).or_default();

        // Another reader may have populated it between the two locks
        if let Slot::Populated(rows) = &entry.slot {
            return Lookup::Hit(Arc::clone(rows));
        }

        entry.slot = Slot::Empty;
        Lookup::Miss {
            generation: entry.generation,
        }
    }

    /// Stores freshly read rows
    ///
    /// Returns `false` (and stores nothing) when `table` was invalidated after
    /// `generation` was handed out.
    pub async fn populate(&self, table: Table, generation: u64, rows: Vec<JsonValue>) -> bool {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(table).or_default();

        if entry.generation != generation {
            tracing::debug!(%table, generation, current = entry.generation, "discarding outdated read");
            return false;
        }

        entry.slot = Slot::Populated(Arc::new(rows));
        true
    }

    /// Marks `table` stale after a successful write
    pub async fn invalidate(&self, table: Table) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(table).or_default();

        entry.generation += 1;
        if matches!(entry.slot, Slot::Populated(_)) {
            entry.slot = Slot::Stale;
        }

        tracing::debug!(%table, generation = entry.generation, "cache invalidated");
    }

    /// Marks every table stale
    pub async fn invalidate_all(&self) {
        for table in Table::ALL {
            self.invalidate(table).await;
        }
    }

    /// Current state of `table`
    pub async fn state(&self, table: Table) -> CacheState {
        let entries = self.entries.read().await;
        match entries.get(&table).map(|e| &e.slot) {
            Some(Slot::Populated(_)) => CacheState::Populated,
            Some(Slot::Stale) => CacheState::Stale,
            Some(Slot::Empty) | None => CacheState::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn miss_generation(cache: &QueryCache, table: Table) -> u64 {
        match cache.lookup(table).await {
            Lookup::Miss { generation } => generation,
            Lookup::Hit(_) => panic!("expected a miss for {}", table),
        }
    }

    #[tokio::test]
    async fn test_empty_cache_misses() {
        let cache = QueryCache::new();
        assert_eq!(cache.state(Table::Tasks).await, CacheState::Empty);
        assert_eq!(miss_generation(&cache, Table::Tasks).await, 0);
    }

    #[tokio::test]
    async fn test_populated_cache_hits() {
        let cache = QueryCache::new();
        let generation = miss_generation(&cache, Table::Tasks).await;

        assert!(cache.populate(Table::Tasks, generation, vec![json!({"id": 1})]).await);

        match cache.lookup(Table::Tasks).await {
            Lookup::Hit(rows) => assert_eq!(rows.len(), 1),
            Lookup::Miss { .. } => panic!("expected a hit"),
        }
    }

    #[tokio::test]
    async fn test_full_state_cycle() {
        let cache = QueryCache::new();
        let generation = miss_generation(&cache, Table::Tasks).await;
        cache.populate(Table::Tasks, generation, Vec::new()).await;
        assert_eq!(cache.state(Table::Tasks).await, CacheState::Populated);

        cache.invalidate(Table::Tasks).await;
        assert_eq!(cache.state(Table::Tasks).await, CacheState::Stale);

        let generation = miss_generation(&cache, Table::Tasks).await;
        assert_eq!(generation, 1);
        assert_eq!(cache.state(Table::Tasks).await, CacheState::Empty);

        cache.populate(Table::Tasks, generation, Vec::new()).await;
        assert_eq!(cache.state(Table::Tasks).await, CacheState::Populated);
    }

    #[tokio::test]
    async fn test_invalidation_is_per_table() {
        let cache = QueryCache::new();
        for table in Table::ALL {
            let generation = miss_generation(&cache, table).await;
            cache.populate(table, generation, Vec::new()).await;
        }

        cache.invalidate(Table::UserData).await;

        assert_eq!(cache.state(Table::Tasks).await, CacheState::Populated);
        assert_eq!(cache.state(Table::UserData).await, CacheState::Stale);
    }

    #[tokio::test]
    async fn test_read_overlapping_write_is_discarded() {
        let cache = QueryCache::new();
        let generation = miss_generation(&cache, Table::Tasks).await;

        // A write lands while the read is in flight
        cache.invalidate(Table::Tasks).await;

        assert!(!cache.populate(Table::Tasks, generation, vec![json!({"id": 1})]).await);
        assert_eq!(cache.state(Table::Tasks).await, CacheState::Empty);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = QueryCache::new();
        for table in Table::ALL {
            let generation = miss_generation(&cache, table).await;
            cache.populate(table, generation, Vec::new()).await;
        }

        cache.invalidate_all().await;

        for table in Table::ALL {
            assert_eq!(cache.state(table).await, CacheState::Stale);
        }
    }
}
