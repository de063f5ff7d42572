//! Entity synthesizers for the independent tables.
//!
//! Each row draws from its own RNG derived from the table seed, the row index
//! and the attempt number, so a retried row never shifts the rows after it.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use salesforge_core::sales::{self, SALES_DEPARTMENT};
use salesforge_core::{Category, Customer, Employee, Product, Supplier};

use crate::compose::round_currency;
use crate::engine::hash_row_seed;
use crate::errors::GenerationError;
use crate::faker::FakeDataProvider;
use crate::ids::{EntityKind, IdAllocator};

pub const MIN_PRICE: f64 = 10.0;
pub const MAX_PRICE: f64 = 1000.0;
pub const MAX_STOCK: i64 = 500;

/// Rows produced for one table plus the number of rejected attempts.
#[derive(Debug, Clone)]
pub struct TableOutput<T> {
    pub rows: Vec<T>,
    pub retries: u64,
}

/// Builds records for one table from a fake-data provider.
pub struct Synthesizer<'a> {
    provider: &'a dyn FakeDataProvider,
    table_seed: u64,
    max_attempts_row: u32,
}

impl<'a> Synthesizer<'a> {
    pub fn new(provider: &'a dyn FakeDataProvider, table_seed: u64, max_attempts_row: u32) -> Self {
        Self {
            provider,
            table_seed,
            max_attempts_row,
        }
    }

    /// Customers with emails unique across the batch.
    pub fn customers(
        &self,
        count: u64,
        ids: &mut IdAllocator,
    ) -> Result<TableOutput<Customer>, GenerationError> {
        let mut seen_emails = HashSet::new();
        let mut rows = Vec::with_capacity(count as usize);
        let mut retries = 0;

        for row_index in 0..count {
            let mut attempt = 0;
            loop {
                attempt += 1;
                let mut rng = self.row_rng(row_index, attempt);
                let first_name = self.provider.first_name(&mut rng);
                let last_name = self.provider.last_name(&mut rng);
                let email = self.provider.email(&mut rng);
                let city = self.provider.city(&mut rng);

                if seen_emails.contains(&email) {
                    if attempt >= self.max_attempts_row {
                        return Err(GenerationError::Exhausted {
                            table: sales::CUSTOMERS.to_string(),
                            row: row_index,
                            attempts: attempt,
                        });
                    }
                    debug!(row = row_index, attempt, email = %email, "duplicate customer email, retrying");
                    retries += 1;
                    continue;
                }

                seen_emails.insert(email.clone());
                rows.push(Customer {
                    customer_id: ids.next(EntityKind::Customer),
                    first_name,
                    last_name,
                    email,
                    city,
                });
                break;
            }
        }

        Ok(TableOutput { rows, retries })
    }

    pub fn suppliers(&self, count: u64, ids: &mut IdAllocator) -> TableOutput<Supplier> {
        let rows = (0..count)
            .map(|row_index| {
                let mut rng = self.row_rng(row_index, 1);
                Supplier {
                    supplier_id: ids.next(EntityKind::Supplier),
                    supplier_name: self.provider.company(&mut rng),
                    contact_email: self.provider.email(&mut rng),
                }
            })
            .collect();
        TableOutput { rows, retries: 0 }
    }

    pub fn employees(&self, count: u64, ids: &mut IdAllocator) -> TableOutput<Employee> {
        let rows = (0..count)
            .map(|row_index| {
                let mut rng = self.row_rng(row_index, 1);
                Employee {
                    employee_id: ids.next(EntityKind::Employee),
                    first_name: self.provider.first_name(&mut rng),
                    last_name: self.provider.last_name(&mut rng),
                    department: SALES_DEPARTMENT.to_string(),
                }
            })
            .collect();
        TableOutput { rows, retries: 0 }
    }

    /// Products referencing suppliers drawn uniformly from `supplier_ids`.
    pub fn products(
        &self,
        count: u64,
        supplier_ids: &[i64],
        ids: &mut IdAllocator,
    ) -> Result<TableOutput<Product>, GenerationError> {
        if count > 0 && supplier_ids.is_empty() {
            return Err(GenerationError::MissingReference(
                "products need at least one supplier".to_string(),
            ));
        }

        let rows = (0..count)
            .map(|row_index| {
                let mut rng = self.row_rng(row_index, 1);
                let product_name = format!(
                    "{} {}",
                    capitalize(&self.provider.word(&mut rng)),
                    capitalize(&self.provider.word(&mut rng))
                );
                let category = Category::ALL[rng.random_range(0..Category::ALL.len())];
                let price = round_currency(rng.random_range(MIN_PRICE..=MAX_PRICE));
                let stock_quantity = rng.random_range(0..=MAX_STOCK);
                let supplier_id = supplier_ids[rng.random_range(0..supplier_ids.len())];
                Product {
                    product_id: ids.next(EntityKind::Product),
                    product_name,
                    category,
                    price,
                    stock_quantity,
                    supplier_id,
                }
            })
            .collect();

        Ok(TableOutput { rows, retries: 0 })
    }

    fn row_rng(&self, row_index: u64, attempt: u32) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(hash_row_seed(self.table_seed, row_index, attempt))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
