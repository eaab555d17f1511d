//! In-memory connector for unit testing.
//!
//! Behaves like the PostgreSQL connector (generated ids, newest-first
//! listing, negative limit/offset rejected) without a database. It also
//! counts open sessions so tests can check that every request releases its
//! connection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::item::{Item, ItemId, ItemKey, NewItem};

use super::{Connector, ItemSession};

/// Configuration for mock connector behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    /// Refuse every connection.
    pub unreachable: bool,
    /// Fail every statement with a driver-style message.
    pub fail_statements: bool,
    /// Apply writes, then fail at commit time and roll them back.
    pub fail_on_commit: bool,
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<Item>,
    last_id: ItemId,
}

/// In-memory connector.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    config: MemoryConfig,
    table: Arc<Mutex<Table>>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemoryConnector {
    /// Create a reachable, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with custom failure behavior.
    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// A connector over the same rows with different failure behavior.
    pub fn sharing_rows(&self, config: MemoryConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// Shorthand for a store whose database is down.
    pub fn unreachable() -> Self {
        Self::with_config(MemoryConfig {
            unreachable: true,
            ..MemoryConfig::default()
        })
    }

    /// Sessions opened and not yet closed or dropped.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Number of stored rows.
    pub fn row_count(&self) -> usize {
        lock(&self.table).rows.len()
    }
}

fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Option<Box<dyn ItemSession>> {
        if self.config.unreachable {
            return None;
        }

        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(MemorySession {
            fail_statements: self.config.fail_statements,
            fail_on_commit: self.config.fail_on_commit,
            table: Arc::clone(&self.table),
            open_sessions: Arc::clone(&self.open_sessions),
        }))
    }
}

struct MemorySession {
    fail_statements: bool,
    fail_on_commit: bool,
    table: Arc<Mutex<Table>>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemorySession {
    fn check(&self) -> Result<(), StoreError> {
        if self.fail_statements {
            return Err(StoreError::Statement(
                "simulated statement failure".to_string(),
            ));
        }
        Ok(())
    }

    /// Run `write` as a transaction: the table is restored if the commit
    /// fails. Ids consumed by a rolled-back insert are not reissued, as with
    /// a Postgres sequence.
    fn transaction<T>(&self, write: impl FnOnce(&mut Table) -> T) -> Result<T, StoreError> {
        self.check()?;
        let mut table = lock(&self.table);
        let snapshot = table.clone();
        let value = write(&mut table);

        if self.fail_on_commit {
            let last_id = table.last_id;
            *table = snapshot;
            table.last_id = last_id;
            return Err(StoreError::Statement(
                "simulated commit failure".to_string(),
            ));
        }
        Ok(value)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemSession for MemorySession {
    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, StoreError> {
        self.transaction(|table| {
            table.last_id += 1;
            let row = Item {
                id: table.last_id,
                name: item.name.clone(),
                description: item.description.clone(),
            };
            table.rows.push(row.clone());
            row
        })
    }

    async fn list_items(&mut self, skip: i64, limit: i64) -> Result<Vec<Item>, StoreError> {
        self.check()?;
        if limit < 0 {
            return Err(StoreError::Statement("LIMIT must not be negative".to_string()));
        }
        if skip < 0 {
            return Err(StoreError::Statement("OFFSET must not be negative".to_string()));
        }

        let table = lock(&self.table);
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn delete_item(&mut self, id: ItemKey) -> Result<Option<ItemId>, StoreError> {
        self.transaction(|table| {
            let position = table.rows.iter().position(|row| ItemKey::from(row.id) == id)?;
            Some(table.rows.remove(position).id)
        })
    }

    async fn close(self: Box<Self>) {}
}
