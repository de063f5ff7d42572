//! Order composition: sales with 1..=5 line items and a derived total.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use salesforge_core::{LineItem, PaymentMethod, Product, Sale};

use crate::engine::hash_row_seed;
use crate::errors::GenerationError;
use crate::ids::{EntityKind, IdAllocator};

pub const MAX_ITEMS_PER_SALE: u32 = 5;
pub const MAX_QUANTITY: i64 = 10;

/// Round a monetary amount to 2 decimals.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Unit prices keyed by product id, in cents.
///
/// Built once before composition, either from committed `products` rows or
/// from the in-memory products of the same run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    product_ids: Vec<i64>,
    cents: BTreeMap<i64, i64>,
}

impl PriceTable {
    pub fn from_products(products: &[Product]) -> Self {
        Self::from_prices(products.iter().map(|product| (product.product_id, product.price)))
    }

    pub fn from_prices<I>(prices: I) -> Self
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        let cents: BTreeMap<i64, i64> = prices
            .into_iter()
            .map(|(product_id, price)| (product_id, to_cents(price)))
            .collect();
        let product_ids = cents.keys().copied().collect();
        Self { product_ids, cents }
    }

    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// Product ids in ascending order.
    pub fn product_ids(&self) -> &[i64] {
        &self.product_ids
    }

    pub fn price_cents(&self, product_id: i64) -> Option<i64> {
        self.cents.get(&product_id).copied()
    }

    pub fn price(&self, product_id: i64) -> Option<f64> {
        self.price_cents(product_id).map(cents_to_amount)
    }

    /// Recompute a sale total from line items, rounded to 2 decimals.
    pub fn total_for<'a, I>(&self, items: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        let mut cents = 0_i64;
        for item in items {
            cents += self.price_cents(item.product_id)? * item.quantity;
        }
        Some(cents_to_amount(cents))
    }
}

/// Inclusive range of dates a sale may fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The `days`-long window ending on `end`.
    pub fn trailing(end: NaiveDate, days: u32) -> Result<Self, GenerationError> {
        let start = end
            .checked_sub_signed(TimeDelta::days(i64::from(days)))
            .ok_or_else(|| {
                GenerationError::InvalidOptions(format!(
                    "a {days}-day window before {end} is out of range"
                ))
            })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn pick(&self, rng: &mut impl Rng) -> NaiveDate {
        let span = (self.end - self.start).num_days();
        self.start + TimeDelta::days(rng.random_range(0..=span))
    }
}

/// Sales and their line items, in generation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Orders {
    pub sales: Vec<Sale>,
    pub line_items: Vec<LineItem>,
}

/// Composes sales against a fixed price table.
pub struct OrderComposer<'a> {
    prices: &'a PriceTable,
    window: DateWindow,
    table_seed: u64,
}

impl<'a> OrderComposer<'a> {
    pub fn new(prices: &'a PriceTable, window: DateWindow, table_seed: u64) -> Self {
        Self {
            prices,
            window,
            table_seed,
        }
    }

    pub fn compose(
        &self,
        sale_count: u64,
        customer_ids: &[i64],
        employee_ids: &[i64],
        ids: &mut IdAllocator,
    ) -> Result<Orders, GenerationError> {
        let mut orders = Orders::default();
        if sale_count == 0 {
            return Ok(orders);
        }

        for (values, what) in [
            (customer_ids, "customers"),
            (employee_ids, "employees"),
            (self.prices.product_ids(), "products"),
        ] {
            if values.is_empty() {
                return Err(GenerationError::MissingReference(format!(
                    "sales need at least one row in {what}"
                )));
            }
        }

        orders.sales.reserve(sale_count as usize);

        for sale_index in 0..sale_count {
            let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(self.table_seed, sale_index, 1));
            let sale_id = ids.next(EntityKind::Sale);
            let customer_id = pick(customer_ids, &mut rng);
            let employee_id = pick(employee_ids, &mut rng);
            let sale_date = self.window.pick(&mut rng);
            let payment_method = PaymentMethod::ALL[rng.random_range(0..PaymentMethod::ALL.len())];

            let item_count = rng.random_range(1..=MAX_ITEMS_PER_SALE);
            let mut total_cents = 0_i64;
            for _ in 0..item_count {
                let product_id = pick(self.prices.product_ids(), &mut rng);
                let quantity = rng.random_range(1..=MAX_QUANTITY);
                let unit_cents = self.prices.price_cents(product_id).ok_or_else(|| {
                    GenerationError::MissingReference(format!("no price for product {product_id}"))
                })?;
                total_cents += unit_cents * quantity;

                orders.line_items.push(LineItem {
                    order_detail_id: ids.next(EntityKind::LineItem),
                    sale_id,
                    product_id,
                    quantity,
                });
            }

            orders.sales.push(Sale {
                sale_id,
                customer_id,
                employee_id,
                sale_date,
                total_amount: cents_to_amount(total_cents),
                payment_method,
            });
        }

        Ok(orders)
    }
}

fn pick(values: &[i64], rng: &mut impl Rng) -> i64 {
    values[rng.random_range(0..values.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn line_item(order_detail_id: i64, product_id: i64, quantity: i64) -> LineItem {
        LineItem {
            order_detail_id,
            sale_id: 1,
            product_id,
            quantity,
        }
    }

    #[test]
    fn totals_use_cent_arithmetic() {
        let prices = PriceTable::from_prices([(1, 19.99), (2, 0.1), (3, 333.33)]);
        let items = [
            line_item(1, 1, 3),
            line_item(2, 2, 7),
            line_item(3, 3, 10),
        ];
        assert_eq!(prices.total_for(&items), Some(3393.97));
        assert_eq!(prices.price(2), Some(0.1));
        assert_eq!(prices.total_for(&[line_item(4, 9, 1)]), None);
    }

    #[test]
    fn price_table_orders_ids() {
        let prices = PriceTable::from_prices([(3, 1.0), (1, 2.0), (2, 3.0)]);
        assert_eq!(prices.product_ids(), &[1, 2, 3]);
        assert_eq!(prices.len(), 3);
    }

    #[test]
    fn trailing_window_is_inclusive() {
        let window = DateWindow::trailing(date(2024, 3, 1), 365).expect("window");
        assert_eq!(window.start, date(2023, 3, 2));
        assert!(window.contains(date(2024, 3, 1)));
        assert!(window.contains(date(2023, 3, 2)));
        assert!(!window.contains(date(2023, 3, 1)));
    }

    #[test]
    fn composes_consistent_orders() {
        let prices = PriceTable::from_prices((1..=20).map(|id| (id, 10.0 + id as f64 * 1.25)));
        let window = DateWindow::trailing(date(2025, 6, 30), 30).expect("window");
        let composer = OrderComposer::new(&prices, window, 1234);
        let mut ids = IdAllocator::new();

        let orders = composer.compose(200, &[1, 2, 3], &[1, 2], &mut ids).expect("compose");
        assert_eq!(orders.sales.len(), 200);
        assert_eq!(ids.issued(EntityKind::LineItem), orders.line_items.len() as i64);

        for sale in &orders.sales {
            let items: Vec<&LineItem> = orders
                .line_items
                .iter()
                .filter(|item| item.sale_id == sale.sale_id)
                .collect();
            assert!((1..=MAX_ITEMS_PER_SALE as usize).contains(&items.len()));
            assert!(items.iter().all(|item| (1..=MAX_QUANTITY).contains(&item.quantity)));
            assert_eq!(prices.total_for(items.iter().copied()), Some(sale.total_amount));
            assert!(window.contains(sale.sale_date));
            assert!([1, 2, 3].contains(&sale.customer_id));
            assert!([1, 2].contains(&sale.employee_id));
        }
    }

    #[test]
    fn missing_references_are_reported() {
        let prices = PriceTable::default();
        let window = DateWindow::trailing(date(2025, 1, 1), 10).expect("window");
        let composer = OrderComposer::new(&prices, window, 1);
        let mut ids = IdAllocator::new();

        let err = composer.compose(1, &[1], &[1], &mut ids).expect_err("no products");
        assert!(err.to_string().contains("products"));
        assert!(composer.compose(0, &[], &[], &mut ids).expect("nothing to do").sales.is_empty());
    }
}
