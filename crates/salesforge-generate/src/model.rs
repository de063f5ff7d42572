use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
use crate::faker::LocaleKey;

/// Number of rows to generate per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityCounts {
    pub customers: u64,
    pub suppliers: u64,
    pub employees: u64,
    pub products: u64,
    pub sales: u64,
}

impl Default for EntityCounts {
    fn default() -> Self {
        Self {
            customers: 500,
            suppliers: 50,
            employees: 20,
            products: 200,
            sales: 1000,
        }
    }
}

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Seed for every random draw of the run.
    pub seed: u64,
    pub counts: EntityCounts,
    /// Last day of the sale-date window. Defaults to today when unset.
    pub base_date: Option<NaiveDate>,
    /// Length of the trailing sale-date window in days.
    pub window_days: u32,
    pub locale: LocaleKey,
    /// Maximum attempts to build a single row that satisfies unique constraints.
    pub max_attempts_row: u32,
    /// Id recorded in the generation report. A fresh id is drawn when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            counts: EntityCounts::default(),
            base_date: None,
            window_days: 365,
            locale: LocaleKey::EnUs,
            max_attempts_row: 50,
            run_id: None,
        }
    }
}

impl GenerateOptions {
    /// Reject option sets that cannot produce referentially valid data.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let counts = &self.counts;
        if counts.products > 0 && counts.suppliers == 0 {
            return Err(GenerationError::InvalidOptions(
                "products require at least one supplier".to_string(),
            ));
        }
        if counts.sales > 0 {
            for (count, entity) in [
                (counts.customers, "customer"),
                (counts.employees, "employee"),
                (counts.products, "product"),
            ] {
                if count == 0 {
                    return Err(GenerationError::InvalidOptions(format!(
                        "sales require at least one {entity}"
                    )));
                }
            }
        }
        if self.max_attempts_row == 0 {
            return Err(GenerationError::InvalidOptions(
                "max_attempts_row must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of a generated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_generated: u64,
    pub retries: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub base_date: NaiveDate,
    pub tables: Vec<TableReport>,
    pub retries_total: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64, base_date: NaiveDate) -> Self {
        Self {
            run_id,
            seed,
            base_date,
            tables: Vec::new(),
            retries_total: 0,
            duration_ms: 0,
        }
    }

    pub fn record_table(&mut self, table: &str, rows_generated: u64, retries: u64) {
        self.retries_total += retries;
        self.tables.push(TableReport {
            table: table.to_string(),
            rows_generated,
            retries,
        });
    }

    pub fn rows_for(&self, table: &str) -> Option<u64> {
        self.tables
            .iter()
            .find(|report| report.table == table)
            .map(|report| report.rows_generated)
    }
}
