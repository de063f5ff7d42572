use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

use crate::error::StoreError;

pub const DEFAULT_DATABASE: &str = "sales_data.db";
const MEMORY_DATABASE: &str = ":memory:";

/// Options used to open the SQLite store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// File path or `sqlite:` URL. `:memory:` opens a private in-memory database.
    pub database: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Enforce declared foreign keys on insert.
    pub foreign_keys: bool,
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            max_connections: 4,
            acquire_timeout_secs: 10,
            foreign_keys: true,
            create_if_missing: true,
        }
    }
}

impl StoreOptions {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_DATABASE)
    }

    /// Open only a database that already exists; used by read-only commands.
    pub fn existing_only(mut self) -> Self {
        if !self.is_in_memory() {
            self.create_if_missing = false;
        }
        self
    }

    pub fn is_in_memory(&self) -> bool {
        let database = self.database.trim();
        database == MEMORY_DATABASE
            || database == "sqlite::memory:"
            || database.contains("mode=memory")
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.database.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "database location must not be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(StoreError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn connect_options(&self) -> Result<SqliteConnectOptions, StoreError> {
        let database = self.database.trim();
        let options = if database == MEMORY_DATABASE {
            SqliteConnectOptions::from_str("sqlite::memory:")
        } else if database.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database)
        } else {
            Ok(SqliteConnectOptions::new()
                .filename(database)
                .journal_mode(SqliteJournalMode::Wal))
        }
        .map_err(|err| StoreError::InvalidConfig(err.to_string()))?;

        Ok(options
            .create_if_missing(self.create_if_missing)
            .foreign_keys(self.foreign_keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_in_memory_locations() {
        assert!(StoreOptions::in_memory().is_in_memory());
        assert!(StoreOptions::new("sqlite::memory:").is_in_memory());
        assert!(!StoreOptions::default().is_in_memory());
    }

    #[test]
    fn existing_only_keeps_memory_databases_creatable() {
        assert!(!StoreOptions::new("sales.db").existing_only().create_if_missing);
        assert!(StoreOptions::in_memory().existing_only().create_if_missing);
    }

    #[test]
    fn rejects_empty_location() {
        let err = StoreOptions::new("  ").validate().expect_err("empty");
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn builds_connect_options_for_paths_and_urls() {
        StoreOptions::new("data/sales.db").connect_options().expect("path");
        StoreOptions::new("sqlite://sales.db?mode=rwc").connect_options().expect("url");
        StoreOptions::in_memory().connect_options().expect("memory");
    }
}
