use async_trait::async_trait;

use crate::error::StoreError;
use crate::gateway::QueryOutcome;
use crate::store::SqliteStore;

/// Read-only SQL capability consumed by the audit and the CLI.
#[async_trait]
pub trait SqlEngine: Send + Sync {
    /// Returns the engine identifier (e.g. `sqlite`).
    fn engine(&self) -> &'static str;

    /// Execute a statement without persisting any change.
    async fn execute(&self, sql: &str) -> Result<QueryOutcome, StoreError>;

    /// Describe every table with sample rows.
    async fn describe_schema(&self) -> Result<String, StoreError>;
}

#[async_trait]
impl SqlEngine for SqliteStore {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    async fn execute(&self, sql: &str) -> Result<QueryOutcome, StoreError> {
        SqliteStore::execute(self, sql).await
    }

    async fn describe_schema(&self) -> Result<String, StoreError> {
        SqliteStore::describe_schema(self).await
    }
}
