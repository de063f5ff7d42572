use serde::{Deserialize, Serialize};

use crate::model::Violation;

/// Contract version for audit output.
pub const AUDIT_VERSION: &str = "0.1";

/// Machine-readable result of an audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub audit_version: String,
    pub engine: String,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_fingerprint: Option<String>,
    pub tables: Vec<TableMetrics>,
    pub checks: CheckSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    pub duration_ms: u64,
}

impl AuditReport {
    pub fn violation_count(&self) -> u64 {
        self.violations.iter().map(|violation| violation.count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Per-table row counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetrics {
    pub table: String,
    pub rows_found: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_expected: Option<u64>,
}

/// Checked and violating counts per audit rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub row_counts: CheckStats,
    pub dense_ids: CheckStats,
    pub fk: CheckStats,
    pub unique: CheckStats,
    pub totals: CheckStats,
    pub items_per_sale: CheckStats,
    pub quantity: CheckStats,
    pub line_item_ids: CheckStats,
}

impl CheckSummary {
    /// Rows for the markdown table, in a fixed order.
    pub fn entries(&self) -> [(&'static str, &CheckStats); 8] {
        [
            ("row_counts", &self.row_counts),
            ("dense_ids", &self.dense_ids),
            ("fk", &self.fk),
            ("unique", &self.unique),
            ("totals", &self.totals),
            ("items_per_sale", &self.items_per_sale),
            ("quantity", &self.quantity),
            ("line_item_ids", &self.line_item_ids),
        ]
    }
}

/// Generic check counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStats {
    pub checked: u64,
    pub violations: u64,
}
