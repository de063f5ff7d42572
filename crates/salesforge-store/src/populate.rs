use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use salesforge_core::DatasetSchema;
use salesforge_core::sales;
use salesforge_generate::{GenerationEngine, GenerationError, GenerationReport};

use crate::error::StoreError;
use crate::loader::TableLoad;
use crate::store::SqliteStore;

/// Step of the population pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SchemaInstall,
    Synthesis,
    Composition,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SchemaInstall => "schema install",
            Self::Synthesis => "synthesis",
            Self::Composition => "composition",
        })
    }
}

#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// A population failure tagged with the phase it happened in.
#[derive(Debug, Error)]
#[error("{phase} failed: {source}")]
pub struct PopulateError {
    pub phase: Phase,
    pub source: PhaseError,
}

trait InPhase<T> {
    fn in_phase(self, phase: Phase) -> Result<T, PopulateError>;
}

impl<T, E: Into<PhaseError>> InPhase<T> for Result<T, E> {
    fn in_phase(self, phase: Phase) -> Result<T, PopulateError> {
        self.map_err(|err| PopulateError {
            phase,
            source: err.into(),
        })
    }
}

/// Result of a full population pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub report: GenerationReport,
    pub tables: Vec<TableLoad>,
    pub duration_ms: u64,
}

impl PopulationSummary {
    pub fn rows_for(&self, table: &str) -> Option<u64> {
        self.tables
            .iter()
            .find(|load| load.table == table)
            .map(|load| load.rows)
    }
}

const REQUIRED_TABLES: [&str; 6] = [
    sales::CUSTOMERS,
    sales::SUPPLIERS,
    sales::EMPLOYEES,
    sales::PRODUCTS,
    sales::SALES,
    sales::ORDER_DETAILS,
];

/// Install the schema, then generate and load the dataset in one pass.
///
/// Base tables are committed before orders are composed; sale totals are
/// priced from the committed `products` rows.
pub async fn populate(
    store: &mut SqliteStore,
    schema: &DatasetSchema,
    engine: &GenerationEngine,
) -> Result<PopulationSummary, PopulateError> {
    let started = Instant::now();
    let result = run_phases(store, schema, engine).await;
    match result {
        Ok((report, tables)) => {
            let duration_ms = started.elapsed().as_millis() as u64;
            info!(
                run_id = %report.run_id,
                tables = tables.len(),
                rows = tables.iter().map(|load| load.rows).sum::<u64>(),
                duration_ms,
                "population completed"
            );
            Ok(PopulationSummary {
                report,
                tables,
                duration_ms,
            })
        }
        Err(err) => {
            warn!(phase = %err.phase, error = %err.source, "population failed");
            Err(err)
        }
    }
}

async fn run_phases(
    store: &mut SqliteStore,
    schema: &DatasetSchema,
    engine: &GenerationEngine,
) -> Result<(GenerationReport, Vec<TableLoad>), PopulateError> {
    if let Some(missing) = REQUIRED_TABLES
        .iter()
        .find(|name| schema.table(name).is_none())
    {
        return Err(StoreError::InvalidSchema(format!(
            "schema does not declare table '{missing}'"
        )))
        .in_phase(Phase::SchemaInstall);
    }
    store
        .install(schema)
        .await
        .in_phase(Phase::SchemaInstall)?;

    let mut run = engine.start().in_phase(Phase::Synthesis)?;
    let base = run
        .synthesize_base()
        .in_phase(Phase::Synthesis)?;
    let mut tables = store
        .load_base(&base)
        .await
        .in_phase(Phase::Synthesis)?;

    let prices = store
        .load_price_table()
        .await
        .in_phase(Phase::Composition)?;
    let orders = run
        .compose_orders(&base.customer_ids(), &base.employee_ids(), &prices)
        .in_phase(Phase::Composition)?;
    tables.extend(
        store
            .load_orders(&orders)
            .await
            .in_phase(Phase::Composition)?,
    );

    Ok((run.finish(), tables))
}
