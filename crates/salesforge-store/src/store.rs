use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::options::StoreOptions;

/// Handle to the SQLite database holding the sales dataset.
///
/// Writers (`install`, `load_*`, population) take `&mut self`; the query
/// gateway and catalog reporter only need `&self`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    options: StoreOptions,
}

impl SqliteStore {
    /// Open the database and check that it answers.
    pub async fn connect(options: StoreOptions) -> Result<Self, StoreError> {
        options.validate()?;
        let connect_options = options.connect_options()?;

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout());
        if options.is_in_memory() {
            // Every connection to `:memory:` is its own database.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(StoreError::Unreachable)?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(StoreError::Unreachable)?;

        info!(database = %options.database, in_memory = options.is_in_memory(), "store connected");
        Ok(Self { pool, options })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Close every pooled connection.
    pub async fn close(self) {
        self.pool.close().await;
        debug!(database = %self.options.database, "store closed");
    }
}
