use std::time::Instant;

use tracing::{info, warn};

use salesforge_core::sales;
use salesforge_core::{DatasetSchema, ForeignKey, Table};
use salesforge_generate::EntityCounts;
use salesforge_generate::compose::{MAX_ITEMS_PER_SALE, MAX_QUANTITY};
use salesforge_store::ddl::quote_ident;
use salesforge_store::{QueryOutcome, QueryResult, ScalarValue, SqlEngine};

use crate::errors::EvalError;
use crate::metrics::{AUDIT_VERSION, AuditReport, CheckStats, CheckSummary, TableMetrics};
use crate::model::{AuditOptions, Violation};
use crate::report::render_report;

/// Tolerance when comparing stored totals with recomputed ones.
const TOTAL_TOLERANCE: f64 = 0.005;

/// Audits a populated store against the dataset invariants.
#[derive(Debug, Clone, Default)]
pub struct AuditEngine {
    options: AuditOptions,
}

impl AuditEngine {
    pub fn new(options: AuditOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Markdown report listing at most `max_examples` violations.
    pub fn render(&self, report: &AuditReport) -> String {
        render_report(report, self.options.max_examples)
    }

    pub async fn run(
        &self,
        engine: &dyn SqlEngine,
        schema: &DatasetSchema,
        expected: Option<&EntityCounts>,
    ) -> Result<AuditReport, EvalError> {
        let started = Instant::now();
        let mut audit = Audit {
            engine,
            checks: CheckSummary::default(),
            violations: Vec::new(),
        };

        let mut tables = Vec::with_capacity(schema.tables.len());
        for table in &schema.tables {
            let rows_found = audit.count(&format!("SELECT COUNT(*) FROM {}", quote_ident(&table.name))).await?;
            let rows_expected = expected.and_then(|counts| expected_rows(counts, &table.name));
            if let Some(rows_expected) = rows_expected {
                audit.checks.row_counts.checked += 1;
                if rows_expected != rows_found {
                    audit.checks.row_counts.violations += 1;
                    audit.violations.push(Violation {
                        code: "row_count".to_string(),
                        path: table.name.clone(),
                        message: format!("expected {rows_expected} row(s), found {rows_found}"),
                        count: 1,
                        example: None,
                    });
                }
            }
            tables.push(TableMetrics {
                table: table.name.clone(),
                rows_found,
                rows_expected,
            });

            audit.dense_ids(table).await?;
            for fk in table.foreign_keys() {
                audit.foreign_key(table, fk).await?;
            }
            for unique in table.unique_constraints() {
                audit.unique(table, &unique.columns).await?;
            }
        }

        if [sales::SALES, sales::ORDER_DETAILS, sales::PRODUCTS]
            .iter()
            .all(|name| schema.table(name).is_some())
        {
            audit.totals().await?;
            audit.items_per_sale().await?;
            audit.quantities().await?;
            audit.line_item_ids().await?;
        }

        let report = AuditReport {
            audit_version: AUDIT_VERSION.to_string(),
            engine: engine.engine().to_string(),
            schema_version: schema.schema_version.clone(),
            schema_fingerprint: None,
            tables,
            checks: audit.checks,
            violations: audit.violations,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        let violations = report.violation_count();
        if violations > 0 {
            warn!(violations, strict = self.options.strict, "audit found violations");
            if self.options.strict {
                return Err(EvalError::Violations(violations));
            }
        } else {
            info!(tables = report.tables.len(), duration_ms = report.duration_ms, "audit passed");
        }
        Ok(report)
    }
}

/// Audit with default options.
pub async fn audit(
    engine: &dyn SqlEngine,
    schema: &DatasetSchema,
    expected: Option<&EntityCounts>,
) -> Result<AuditReport, EvalError> {
    AuditEngine::default().run(engine, schema, expected).await
}

fn expected_rows(counts: &EntityCounts, table: &str) -> Option<u64> {
    match table {
        sales::CUSTOMERS => Some(counts.customers),
        sales::SUPPLIERS => Some(counts.suppliers),
        sales::EMPLOYEES => Some(counts.employees),
        sales::PRODUCTS => Some(counts.products),
        sales::SALES => Some(counts.sales),
        _ => None,
    }
}

struct Audit<'a> {
    engine: &'a dyn SqlEngine,
    checks: CheckSummary,
    violations: Vec<Violation>,
}

impl Audit<'_> {
    async fn query(&self, sql: &str) -> Result<QueryResult, EvalError> {
        match self.engine.execute(sql).await? {
            QueryOutcome::Table(result) => Ok(result),
            QueryOutcome::Failure(failure) => Err(EvalError::InvalidDataset(format!(
                "audit query failed: {} ({sql})",
                failure.message
            ))),
        }
    }

    async fn count(&self, sql: &str) -> Result<u64, EvalError> {
        let result = self.query(sql).await?;
        Ok(integer_cell(&result, 0)?.max(0) as u64)
    }

    /// First row of `sql` rendered as `column=value` pairs.
    async fn example(&self, sql: &str) -> Result<Option<String>, EvalError> {
        let result = self.query(sql).await?;
        Ok(result.rows.first().map(|row| {
            result
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| format!("{column}={value}"))
                .collect::<Vec<_>>()
                .join(", ")
        }))
    }

    fn record(stats: &mut CheckStats, violations: &mut Vec<Violation>, violation: Option<Violation>) {
        stats.checked += 1;
        if let Some(violation) = violation {
            stats.violations += violation.count;
            violations.push(violation);
        }
    }

    async fn dense_ids(&mut self, table: &Table) -> Result<(), EvalError> {
        let Some(pk) = table.primary_key() else {
            return Ok(());
        };
        let [column] = pk.columns.as_slice() else {
            return Ok(());
        };
        let column = quote_ident(column);
        let result = self
            .query(&format!(
                "SELECT COUNT(*), COALESCE(MIN({column}), 0), COALESCE(MAX({column}), 0) FROM {}",
                quote_ident(&table.name)
            ))
            .await?;
        let rows = integer_cell(&result, 0)?;
        let min = integer_cell(&result, 1)?;
        let max = integer_cell(&result, 2)?;
        let dense = rows == 0 || (min == 1 && max == rows);

        let violation = (!dense).then(|| Violation {
            code: "sparse_ids".to_string(),
            path: format!("{}.{}", table.name, pk.columns.join(",")),
            message: "ids are not the dense range 1..=rows".to_string(),
            count: 1,
            example: Some(format!("rows={rows}, min={min}, max={max}")),
        });
        Self::record(&mut self.checks.dense_ids, &mut self.violations, violation);
        Ok(())
    }

    async fn foreign_key(&mut self, table: &Table, fk: &ForeignKey) -> Result<(), EvalError> {
        let child = quote_ident(&table.name);
        let parent = quote_ident(&fk.referenced_table);
        let not_null = fk
            .columns
            .iter()
            .map(|column| format!("c.{} IS NOT NULL", quote_ident(column)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let matches = fk
            .columns
            .iter()
            .zip(&fk.referenced_columns)
            .map(|(column, referenced)| {
                format!("p.{} = c.{}", quote_ident(referenced), quote_ident(column))
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        let filter = format!(
            "FROM {child} c WHERE {not_null} AND NOT EXISTS (SELECT 1 FROM {parent} p WHERE {matches})"
        );

        let orphans = self.count(&format!("SELECT COUNT(*) {filter}")).await?;
        let violation = if orphans > 0 {
            let columns = fk
                .columns
                .iter()
                .map(|column| format!("c.{}", quote_ident(column)))
                .collect::<Vec<_>>()
                .join(", ");
            Some(Violation {
                code: "fk_orphan".to_string(),
                path: format!("{}.{}", table.name, fk.columns.join(",")),
                message: format!("{orphans} row(s) reference a missing {}", fk.referenced_table),
                count: orphans,
                example: self.example(&format!("SELECT {columns} {filter} LIMIT 1")).await?,
            })
        } else {
            None
        };
        Self::record(&mut self.checks.fk, &mut self.violations, violation);
        Ok(())
    }

    async fn unique(&mut self, table: &Table, columns: &[String]) -> Result<(), EvalError> {
        let list = columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let duplicates = format!(
            "SELECT {list}, COUNT(*) AS copies FROM {} GROUP BY {list} HAVING COUNT(*) > 1",
            quote_ident(&table.name)
        );
        let groups = self
            .count(&format!("SELECT COUNT(*) FROM ({duplicates})"))
            .await?;
        let violation = if groups > 0 {
            Some(Violation {
                code: "duplicate".to_string(),
                path: format!("{}.{}", table.name, columns.join(",")),
                message: format!("{groups} value(s) appear more than once"),
                count: groups,
                example: self.example(&format!("{duplicates} LIMIT 1")).await?,
            })
        } else {
            None
        };
        Self::record(&mut self.checks.unique, &mut self.violations, violation);
        Ok(())
    }

    async fn totals(&mut self) -> Result<(), EvalError> {
        let filter = format!(
            "FROM sales s WHERE abs(s.total_amount - COALESCE((\
             SELECT round(sum(p.price * od.quantity), 2) \
             FROM order_details od JOIN products p ON p.product_id = od.product_id \
             WHERE od.sale_id = s.sale_id), 0)) > {TOTAL_TOLERANCE}"
        );
        let mismatched = self.count(&format!("SELECT COUNT(*) {filter}")).await?;
        let violation = if mismatched > 0 {
            Some(Violation {
                code: "total_mismatch".to_string(),
                path: "sales.total_amount".to_string(),
                message: format!("{mismatched} sale(s) disagree with their line items"),
                count: mismatched,
                example: self
                    .example(&format!("SELECT s.sale_id, s.total_amount {filter} LIMIT 1"))
                    .await?,
            })
        } else {
            None
        };
        Self::record(&mut self.checks.totals, &mut self.violations, violation);
        Ok(())
    }

    async fn items_per_sale(&mut self) -> Result<(), EvalError> {
        let filter = format!(
            "FROM sales s WHERE (SELECT COUNT(*) FROM order_details od WHERE od.sale_id = s.sale_id) \
             NOT BETWEEN 1 AND {MAX_ITEMS_PER_SALE}"
        );
        let outside = self.count(&format!("SELECT COUNT(*) {filter}")).await?;
        let violation = if outside > 0 {
            Some(Violation {
                code: "items_per_sale".to_string(),
                path: "order_details.sale_id".to_string(),
                message: format!("{outside} sale(s) have outside 1..={MAX_ITEMS_PER_SALE} line items"),
                count: outside,
                example: self.example(&format!("SELECT s.sale_id {filter} LIMIT 1")).await?,
            })
        } else {
            None
        };
        Self::record(&mut self.checks.items_per_sale, &mut self.violations, violation);
        Ok(())
    }

    async fn quantities(&mut self) -> Result<(), EvalError> {
        let filter = format!("FROM order_details WHERE quantity NOT BETWEEN 1 AND {MAX_QUANTITY}");
        let outside = self.count(&format!("SELECT COUNT(*) {filter}")).await?;
        let violation = if outside > 0 {
            Some(Violation {
                code: "quantity_range".to_string(),
                path: "order_details.quantity".to_string(),
                message: format!("{outside} line item(s) have quantity outside 1..={MAX_QUANTITY}"),
                count: outside,
                example: self
                    .example(&format!("SELECT order_detail_id, quantity {filter} LIMIT 1"))
                    .await?,
            })
        } else {
            None
        };
        Self::record(&mut self.checks.quantity, &mut self.violations, violation);
        Ok(())
    }

    async fn line_item_ids(&mut self) -> Result<(), EvalError> {
        let result = self
            .query("SELECT COUNT(*), COALESCE(MAX(order_detail_id), 0) FROM order_details")
            .await?;
        let rows = integer_cell(&result, 0)?;
        let last_id = integer_cell(&result, 1)?;
        let violation = (rows != last_id).then(|| Violation {
            code: "line_item_ids".to_string(),
            path: "order_details.order_detail_id".to_string(),
            message: "line-item count differs from the last issued id".to_string(),
            count: 1,
            example: Some(format!("rows={rows}, last_id={last_id}")),
        });
        Self::record(&mut self.checks.line_item_ids, &mut self.violations, violation);
        Ok(())
    }
}

fn integer_cell(result: &QueryResult, column: usize) -> Result<i64, EvalError> {
    match result.rows.first().and_then(|row| row.get(column)) {
        Some(ScalarValue::Integer(value)) => Ok(*value),
        Some(ScalarValue::Null) => Ok(0),
        other => Err(EvalError::InvalidDataset(format!(
            "expected an integer in column {column}, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_rows_cover_generated_entities() {
        let counts = EntityCounts::default();
        assert_eq!(expected_rows(&counts, sales::CUSTOMERS), Some(500));
        assert_eq!(expected_rows(&counts, sales::SALES), Some(1000));
        assert_eq!(expected_rows(&counts, sales::ORDER_DETAILS), None);
    }

    #[test]
    fn integer_cells_accept_null_as_zero() {
        let result = QueryResult {
            columns: vec!["n".to_string(), "m".to_string()],
            rows: vec![vec![ScalarValue::Integer(4), ScalarValue::Null]],
        };
        assert_eq!(integer_cell(&result, 0).expect("int"), 4);
        assert_eq!(integer_cell(&result, 1).expect("null"), 0);
        assert!(integer_cell(&result, 2).is_err());
    }
}
