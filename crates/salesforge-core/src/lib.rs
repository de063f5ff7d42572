//! Core contracts and helpers for salesforge.
//!
//! This crate defines the schema definition types, the record types of the
//! sales dataset, and the validation and ordering helpers shared by the
//! generator, the store, and the CLI.

pub mod constraints;
pub mod error;
pub mod graph;
pub mod records;
pub mod sales;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{Constraint, ForeignKey, PrimaryKey, UniqueConstraint};
pub use error::{Error, Result};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report, creation_order};
pub use records::{Category, Customer, Employee, LineItem, PaymentMethod, Product, Sale, Supplier};
pub use sales::sales_schema;
pub use schema::{Column, DatasetSchema, Table};
pub use types::ColumnType;
pub use validation::validate_schema;

/// Current contract version for schema definitions.
pub const SCHEMA_VERSION: &str = "0.1";
