//! Per-request database access.
//!
//! A [`Connector`] opens one [`ItemSession`] per request. Opening never fails
//! loudly: an unreachable database yields `None` and the caller decides what
//! that means for its endpoint. Sessions must be [`ItemSession::close`]d on
//! every exit path; dropping one also releases the underlying connection.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::item::{Item, ItemId, ItemKey, NewItem};

pub use memory::{MemoryConfig, MemoryConnector};
pub use postgres::PgConnector;

/// Opens item sessions.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a fresh session, or `None` if the database cannot be reached.
    async fn connect(&self) -> Option<Box<dyn ItemSession>>;
}

/// One live connection, able to run the three item statements.
#[async_trait]
pub trait ItemSession: Send {
    /// Insert a row and return it with its generated id. Commits on success,
    /// rolls back on failure.
    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, StoreError>;

    /// Rows ordered by id descending, after `skip`, at most `limit`.
    async fn list_items(&mut self, skip: i64, limit: i64) -> Result<Vec<Item>, StoreError>;

    /// Delete by id. `Ok(None)` means no row matched. Commits on success,
    /// rolls back on failure.
    async fn delete_item(&mut self, id: ItemKey) -> Result<Option<ItemId>, StoreError>;

    /// Release the connection.
    async fn close(self: Box<Self>);
}
