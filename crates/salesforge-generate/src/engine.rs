use std::fmt;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::info;

use salesforge_core::sales;
use salesforge_core::{Customer, Employee, Product, Supplier};

use crate::compose::{DateWindow, OrderComposer, Orders, PriceTable};
use crate::errors::GenerationError;
use crate::faker::{FakeDataProvider, FakeRsProvider};
use crate::ids::IdAllocator;
use crate::model::{GenerateOptions, GenerationReport};
use crate::synthesize::{Synthesizer, TableOutput};

/// Deterministic generator for the sales dataset.
pub struct GenerationEngine {
    options: GenerateOptions,
    provider: Box<dyn FakeDataProvider>,
}

impl fmt::Debug for GenerationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        let provider = Box::new(FakeRsProvider::new(options.locale));
        Self { options, provider }
    }

    /// Use a custom fake-data provider instead of the `fake` crate.
    pub fn with_provider(options: GenerateOptions, provider: Box<dyn FakeDataProvider>) -> Self {
        Self { options, provider }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Begin a run. Base tables and orders are produced in separate steps so a
    /// store can commit base tables before composing orders.
    pub fn start(&self) -> Result<GenerationRun<'_>, GenerationError> {
        self.options.validate()?;
        let base_date = self
            .options
            .base_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let window = DateWindow::trailing(base_date, self.options.window_days)?;
        let run_id = self
            .options
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        info!(
            run_id = %run_id,
            seed = self.options.seed,
            base_date = %base_date,
            locale = %self.options.locale,
            "generation started"
        );

        Ok(GenerationRun {
            engine: self,
            ids: IdAllocator::new(),
            report: GenerationReport::new(run_id, self.options.seed, base_date),
            window,
            started: Instant::now(),
        })
    }

    /// Generate the whole dataset in memory.
    pub fn run(&self) -> Result<Dataset, GenerationError> {
        let mut run = self.start()?;
        let base = run.synthesize_base()?;
        let prices = PriceTable::from_products(&base.products);
        let orders = run.compose_orders(&base.customer_ids(), &base.employee_ids(), &prices)?;
        let report = run.finish();
        Ok(Dataset {
            base,
            orders,
            report,
        })
    }

    fn synthesizer(&self, table: &str) -> Synthesizer<'_> {
        Synthesizer::new(
            self.provider.as_ref(),
            hash_seed(self.options.seed, table),
            self.options.max_attempts_row,
        )
    }
}

/// One in-progress generation run.
#[derive(Debug)]
pub struct GenerationRun<'a> {
    engine: &'a GenerationEngine,
    ids: IdAllocator,
    report: GenerationReport,
    window: DateWindow,
    started: Instant,
}

impl GenerationRun<'_> {
    pub fn base_date(&self) -> NaiveDate {
        self.report.base_date
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn run_id(&self) -> &str {
        &self.report.run_id
    }

    /// Customers, suppliers, employees and products, in dependency order.
    pub fn synthesize_base(&mut self) -> Result<BaseTables, GenerationError> {
        let counts = self.engine.options.counts;

        let customers = self.record(sales::CUSTOMERS, |engine, ids| {
            engine.synthesizer(sales::CUSTOMERS).customers(counts.customers, ids)
        })?;
        let suppliers = self.record(sales::SUPPLIERS, |engine, ids| {
            Ok(engine.synthesizer(sales::SUPPLIERS).suppliers(counts.suppliers, ids))
        })?;
        let employees = self.record(sales::EMPLOYEES, |engine, ids| {
            Ok(engine.synthesizer(sales::EMPLOYEES).employees(counts.employees, ids))
        })?;
        let supplier_ids: Vec<i64> = suppliers.iter().map(|s| s.supplier_id).collect();
        let products = self.record(sales::PRODUCTS, |engine, ids| {
            engine
                .synthesizer(sales::PRODUCTS)
                .products(counts.products, &supplier_ids, ids)
        })?;

        Ok(BaseTables {
            customers,
            suppliers,
            employees,
            products,
        })
    }

    /// Sales and line items priced from `prices`.
    pub fn compose_orders(
        &mut self,
        customer_ids: &[i64],
        employee_ids: &[i64],
        prices: &PriceTable,
    ) -> Result<Orders, GenerationError> {
        let table_start = Instant::now();
        let composer = OrderComposer::new(
            prices,
            self.window,
            hash_seed(self.engine.options.seed, sales::SALES),
        );
        let orders = composer.compose(
            self.engine.options.counts.sales,
            customer_ids,
            employee_ids,
            &mut self.ids,
        )?;

        for (table, rows) in [
            (sales::SALES, orders.sales.len()),
            (sales::ORDER_DETAILS, orders.line_items.len()),
        ] {
            self.report.record_table(table, rows as u64, 0);
            info!(
                table,
                rows_generated = rows as u64,
                duration_ms = table_start.elapsed().as_millis() as u64,
                "table generated"
            );
        }

        Ok(orders)
    }

    pub fn finish(mut self) -> GenerationReport {
        self.report.duration_ms = self.started.elapsed().as_millis() as u64;
        info!(
            run_id = %self.report.run_id,
            tables = self.report.tables.len(),
            retries_total = self.report.retries_total,
            duration_ms = self.report.duration_ms,
            "generation completed"
        );
        self.report
    }

    fn record<T>(
        &mut self,
        table: &str,
        build: impl FnOnce(&GenerationEngine, &mut IdAllocator) -> Result<TableOutput<T>, GenerationError>,
    ) -> Result<Vec<T>, GenerationError> {
        let table_start = Instant::now();
        let output = build(self.engine, &mut self.ids)?;
        let rows_generated = output.rows.len() as u64;
        self.report.record_table(table, rows_generated, output.retries);
        info!(
            table,
            rows_generated,
            retries = output.retries,
            duration_ms = table_start.elapsed().as_millis() as u64,
            "table generated"
        );
        Ok(output.rows)
    }
}

/// The four independent tables of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseTables {
    pub customers: Vec<Customer>,
    pub suppliers: Vec<Supplier>,
    pub employees: Vec<Employee>,
    pub products: Vec<Product>,
}

impl BaseTables {
    pub fn customer_ids(&self) -> Vec<i64> {
        self.customers.iter().map(|c| c.customer_id).collect()
    }

    pub fn employee_ids(&self) -> Vec<i64> {
        self.employees.iter().map(|e| e.employee_id).collect()
    }

    pub fn supplier_ids(&self) -> Vec<i64> {
        self.suppliers.iter().map(|s| s.supplier_id).collect()
    }
}

/// A fully generated dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub base: BaseTables,
    pub orders: Orders,
    pub report: GenerationReport,
}

pub(crate) fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

pub(crate) fn hash_row_seed(table_seed: u64, row_index: u64, attempt: u32) -> u64 {
    let mut hash = table_seed ^ row_index.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= attempt as u64;
    hash = hash.wrapping_mul(0x100000001b3);
    hash
}
