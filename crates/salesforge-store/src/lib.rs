//! SQLite storage for the salesforge dataset.
//!
//! Installs the declared schema, bulk-loads generated rows and serves the two
//! read paths: ad-hoc SQL through the query gateway and the catalog report.

pub mod adapter;
pub mod catalog;
pub mod ddl;
pub mod error;
pub mod gateway;
pub mod installer;
pub mod loader;
pub mod options;
pub mod populate;
pub mod store;

pub use adapter::SqlEngine;
pub use catalog::{CatalogColumn, CatalogReport, CatalogTable, SAMPLE_ROWS};
pub use error::StoreError;
pub use gateway::{QueryFailure, QueryOutcome, QueryResponse, QueryResult, ScalarValue};
pub use loader::{InsertRow, TableLoad};
pub use options::StoreOptions;
pub use populate::{Phase, PhaseError, PopulateError, PopulationSummary, populate};
pub use store::SqliteStore;
