use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rand::RngCore;

use salesforge_core::sales;
use salesforge_generate::compose::{MAX_ITEMS_PER_SALE, MAX_QUANTITY};
use salesforge_generate::{
    Dataset, EntityKind, FakeDataProvider, GenerateOptions, GenerationEngine, PriceTable,
};

fn fixed_options(seed: u64) -> GenerateOptions {
    GenerateOptions {
        seed,
        base_date: NaiveDate::from_ymd_opt(2025, 3, 31),
        ..GenerateOptions::default()
    }
}

fn generate(options: GenerateOptions) -> Dataset {
    GenerationEngine::new(options).run().expect("generation succeeds")
}

#[test]
fn reference_scenario_produces_consistent_dataset() {
    let dataset = generate(fixed_options(42));
    let base = &dataset.base;
    let orders = &dataset.orders;

    assert_eq!(base.customers.len(), 500);
    assert_eq!(base.suppliers.len(), 50);
    assert_eq!(base.employees.len(), 20);
    assert_eq!(base.products.len(), 200);
    assert_eq!(orders.sales.len(), 1000);

    let mut items_per_sale: BTreeMap<i64, usize> = BTreeMap::new();
    for item in &orders.line_items {
        *items_per_sale.entry(item.sale_id).or_default() += 1;
    }
    let per_sale_sum: usize = items_per_sale.values().sum();
    let last_line_item_id = orders
        .line_items
        .last()
        .map(|item| item.order_detail_id)
        .expect("line items");
    assert_eq!(orders.line_items.len(), per_sale_sum);
    assert_eq!(orders.line_items.len() as i64, last_line_item_id);

    assert_eq!(dataset.report.rows_for(sales::ORDER_DETAILS), Some(per_sale_sum as u64));
    assert_eq!(dataset.report.rows_for(sales::CUSTOMERS), Some(500));
}

#[test]
fn ids_are_dense_per_entity() {
    let dataset = generate(fixed_options(3));
    let base = &dataset.base;
    let dense = |ids: Vec<i64>| ids.iter().copied().eq(1..=ids.len() as i64);

    assert!(dense(base.customer_ids()));
    assert!(dense(base.supplier_ids()));
    assert!(dense(base.employee_ids()));
    assert!(dense(base.products.iter().map(|p| p.product_id).collect()));
    assert!(dense(dataset.orders.sales.iter().map(|s| s.sale_id).collect()));
    assert!(dense(
        dataset.orders.line_items.iter().map(|i| i.order_detail_id).collect()
    ));
}

#[test]
fn references_resolve_and_totals_match() {
    let dataset = generate(fixed_options(11));
    let base = &dataset.base;
    let prices = PriceTable::from_products(&base.products);

    let customer_ids: HashSet<i64> = base.customer_ids().into_iter().collect();
    let employee_ids: HashSet<i64> = base.employee_ids().into_iter().collect();
    let supplier_ids: HashSet<i64> = base.supplier_ids().into_iter().collect();
    let sale_ids: HashSet<i64> = dataset.orders.sales.iter().map(|s| s.sale_id).collect();

    for product in &base.products {
        assert!(supplier_ids.contains(&product.supplier_id));
    }
    for item in &dataset.orders.line_items {
        assert!(sale_ids.contains(&item.sale_id));
        assert!(prices.price(item.product_id).is_some());
        assert!((1..=MAX_QUANTITY).contains(&item.quantity));
    }

    for sale in &dataset.orders.sales {
        assert!(customer_ids.contains(&sale.customer_id));
        assert!(employee_ids.contains(&sale.employee_id));
        let items: Vec<_> = dataset
            .orders
            .line_items
            .iter()
            .filter(|item| item.sale_id == sale.sale_id)
            .collect();
        assert!((1..=MAX_ITEMS_PER_SALE as usize).contains(&items.len()));

        let expected: f64 = items
            .iter()
            .map(|item| prices.price(item.product_id).expect("price") * item.quantity as f64)
            .sum();
        assert!((sale.total_amount - expected).abs() < 0.005);
        assert_eq!(prices.total_for(items.iter().copied()), Some(sale.total_amount));
    }
}

#[test]
fn emails_are_unique_and_employees_work_in_sales() {
    let dataset = generate(fixed_options(5));
    let emails: HashSet<&str> = dataset
        .base
        .customers
        .iter()
        .map(|c| c.email.as_str())
        .collect();
    assert_eq!(emails.len(), dataset.base.customers.len());
    assert!(dataset
        .base
        .employees
        .iter()
        .all(|e| e.department == sales::SALES_DEPARTMENT));
}

#[test]
fn sale_dates_fall_in_trailing_window() {
    let options = fixed_options(8);
    let base_date = options.base_date.expect("base date");
    let start = NaiveDate::from_ymd_opt(2024, 3, 31).expect("date");
    let dataset = generate(options);

    assert_eq!(dataset.report.base_date, base_date);
    for sale in &dataset.orders.sales {
        assert!(start <= sale.sale_date && sale.sale_date <= base_date);
    }
}

#[test]
fn fixed_seed_is_deterministic() {
    let first = generate(fixed_options(99));
    let second = generate(fixed_options(99));
    assert_eq!(first.base, second.base);
    assert_eq!(first.orders, second.orders);
    assert_ne!(first.report.run_id, second.report.run_id);
}

#[test]
fn different_seeds_produce_different_data() {
    let first = generate(fixed_options(1));
    let second = generate(fixed_options(2));
    assert_ne!(first.base.customers, second.base.customers);
    assert_ne!(first.orders, second.orders);
}

#[test]
fn staged_run_composes_against_given_prices() {
    let engine = GenerationEngine::new(fixed_options(21));
    let mut run = engine.start().expect("start");
    let base = run.synthesize_base().expect("base tables");
    assert_eq!(run.ids().issued(EntityKind::Product), 200);

    let flat = PriceTable::from_prices(base.products.iter().map(|p| (p.product_id, 10.0)));
    let orders = run
        .compose_orders(&base.customer_ids(), &base.employee_ids(), &flat)
        .expect("orders");
    let report = run.finish();

    for sale in &orders.sales {
        let quantity: i64 = orders
            .line_items
            .iter()
            .filter(|item| item.sale_id == sale.sale_id)
            .map(|item| item.quantity)
            .sum();
        assert_eq!(sale.total_amount, quantity as f64 * 10.0);
    }
    assert_eq!(report.tables.len(), 6);
}

struct Counting;

impl FakeDataProvider for Counting {
    fn first_name(&self, rng: &mut dyn RngCore) -> String {
        format!("First{}", rng.next_u32() % 1000)
    }
    fn last_name(&self, _rng: &mut dyn RngCore) -> String {
        "Tester".to_string()
    }
    fn email(&self, rng: &mut dyn RngCore) -> String {
        format!("user{}@example.test", rng.next_u32() % 50)
    }
    fn city(&self, _rng: &mut dyn RngCore) -> String {
        "Springfield".to_string()
    }
    fn company(&self, _rng: &mut dyn RngCore) -> String {
        "Acme".to_string()
    }
    fn word(&self, _rng: &mut dyn RngCore) -> String {
        "thing".to_string()
    }
}

#[test]
fn custom_provider_retries_email_collisions() {
    let mut options = fixed_options(17);
    options.counts.customers = 20;
    options.counts.sales = 10;
    options.max_attempts_row = 500;
    let dataset = GenerationEngine::with_provider(options, Box::new(Counting))
        .run()
        .expect("20 of 50 possible emails fit");

    let emails: HashSet<&str> = dataset
        .base
        .customers
        .iter()
        .map(|c| c.email.as_str())
        .collect();
    assert_eq!(emails.len(), 20);
    assert!(dataset.base.products.iter().all(|p| p.product_name == "Thing Thing"));
}
