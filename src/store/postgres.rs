//! PostgreSQL connector: one unpooled `PgConnection` per request.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Executor};
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::item::{Item, ItemId, ItemKey, NewItem};
use crate::metrics;

use super::{Connector, ItemSession};

/// Table bootstrap applied by `todo-api init-db`.
pub const INIT_SQL: &str = include_str!("../../sql/init.sql");

const INSERT_ITEM: &str =
    "INSERT INTO items (name, description) VALUES ($1, $2) RETURNING id, name, description";
const LIST_ITEMS: &str =
    "SELECT id, name, description FROM items ORDER BY id DESC LIMIT $1 OFFSET $2";
// $1 is bound as int8; Postgres compares it against the int4 column directly.
const DELETE_ITEM: &str = "DELETE FROM items WHERE id = $1 RETURNING id";

/// Opens connections from environment-derived settings.
///
/// The password is resolved on every connect so a rotated secret file is
/// picked up without a restart.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: Config,
}

impl PgConnector {
    /// Create a connector for the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn connect_options(&self) -> PgConnectOptions {
        let (password, source) = self.config.resolve_password();
        debug!(?source, "resolved database password");

        PgConnectOptions::new()
            .host(&self.config.db_host)
            .port(self.config.db_port)
            .database(&self.config.db_name)
            .username(&self.config.db_user)
            .password(&password)
    }

    /// Open a connection, surfacing the driver error.
    pub async fn try_connect(&self) -> Result<PgConnection, sqlx::Error> {
        PgConnection::connect_with(&self.connect_options()).await
    }

    /// Create the `items` table if it does not exist.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.try_connect().await?;
        let result = conn.execute(INIT_SQL).await;
        if let Err(e) = conn.close().await {
            debug!(error = %e, "error closing connection after schema init");
        }
        result?;
        Ok(())
    }
}

#[async_trait]
impl Connector for PgConnector {
    #[instrument(skip_all)]
    async fn connect(&self) -> Option<Box<dyn ItemSession>> {
        match self.try_connect().await {
            Ok(conn) => Some(Box::new(PgSession { conn })),
            Err(e) => {
                warn!(
                    host = %self.config.db_host,
                    db = %self.config.db_name,
                    error = %e,
                    "database connection failed"
                );
                metrics::inc_db_connection_failures();
                None
            }
        }
    }
}

/// A live PostgreSQL connection.
struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl ItemSession for PgSession {
    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, StoreError> {
        let mut tx = self.conn.begin().await?;
        let inserted = sqlx::query_as::<_, Item>(INSERT_ITEM)
            .bind(&item.name)
            .bind(&item.description)
            .fetch_one(&mut *tx)
            .await;

        match inserted {
            Ok(row) => {
                tx.commit().await?;
                Ok(row)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }

    async fn list_items(&mut self, skip: i64, limit: i64) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, Item>(LIST_ITEMS)
            .bind(limit)
            .bind(skip)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows)
    }

    async fn delete_item(&mut self, id: ItemKey) -> Result<Option<ItemId>, StoreError> {
        let mut tx = self.conn.begin().await?;
        let deleted = sqlx::query_scalar::<_, ItemId>(DELETE_ITEM)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await;

        match deleted {
            Ok(row) => {
                tx.commit().await?;
                Ok(row)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.conn.close().await {
            debug!(error = %e, "error closing database connection");
        }
    }
}
