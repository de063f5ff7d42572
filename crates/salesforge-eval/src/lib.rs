//! Post-population audit of the salesforge dataset.
//!
//! Every check runs as read-only SQL through [`salesforge_store::SqlEngine`].

pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod report;

pub use engine::{AuditEngine, audit};
pub use errors::EvalError;
pub use metrics::{AUDIT_VERSION, AuditReport, CheckStats, CheckSummary, TableMetrics};
pub use model::{AuditOptions, Violation};
pub use report::render_report;
