//! Chunked multi-row inserts for the dataset records.

use sqlx::query_builder::Separated;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::info;

use salesforge_core::sales;
use salesforge_core::{Customer, Employee, LineItem, Product, Sale, Supplier};
use salesforge_generate::{BaseTables, Orders, PriceTable};

use crate::ddl::quote_ident;
use crate::error::StoreError;
use crate::store::SqliteStore;

/// Rows per INSERT statement; keeps bound parameters well under SQLite's limit.
const INSERT_CHUNK_ROWS: usize = 150;

/// Rows written to one table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TableLoad {
    pub table: String,
    pub rows: u64,
}

/// A record that maps onto one row of a dataset table.
pub trait InsertRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn bind_values<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>);
}

impl InsertRow for Customer {
    const TABLE: &'static str = sales::CUSTOMERS;
    const COLUMNS: &'static [&'static str] =
        &["customer_id", "first_name", "last_name", "email", "city"];

    fn bind_values<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.customer_id)
            .push_bind(self.first_name.as_str())
            .push_bind(self.last_name.as_str())
            .push_bind(self.email.as_str())
            .push_bind(self.city.as_str());
    }
}

impl InsertRow for Supplier {
    const TABLE: &'static str = sales::SUPPLIERS;
    const COLUMNS: &'static [&'static str] = &["supplier_id", "supplier_name", "contact_email"];

    fn bind_values<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.supplier_id)
            .push_bind(self.supplier_name.as_str())
            .push_bind(self.contact_email.as_str());
    }
}

impl InsertRow for Employee {
    const TABLE: &'static str = sales::EMPLOYEES;
    const COLUMNS: &'static [&'static str] =
        &["employee_id", "first_name", "last_name", "department"];

    fn bind_values<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.employee_id)
            .push_bind(self.first_name.as_str())
            .push_bind(self.last_name.as_str())
            .push_bind(self.department.as_str());
    }
}

impl InsertRow for Product {
    const TABLE: &'static str = sales::PRODUCTS;
    const COLUMNS: &'static [&'static str] = &[
        "product_id",
        "product_name",
        "category",
        "price",
        "stock_quantity",
        "supplier_id",
    ];

    fn bind_values<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.product_id)
            .push_bind(self.product_name.as_str())
            .push_bind(self.category.as_str())
            .push_bind(self.price)
            .push_bind(self.stock_quantity)
            .push_bind(self.supplier_id);
    }
}

impl InsertRow for Sale {
    const TABLE: &'static str = sales::SALES;
    const COLUMNS: &'static [&'static str] = &[
        "sale_id",
        "customer_id",
        "employee_id",
        "sale_date",
        "total_amount",
        "payment_method",
    ];

    fn bind_values<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.sale_id)
            .push_bind(self.customer_id)
            .push_bind(self.employee_id)
            .push_bind(self.sale_date.format("%Y-%m-%d").to_string())
            .push_bind(self.total_amount)
            .push_bind(self.payment_method.as_str());
    }
}

impl InsertRow for LineItem {
    const TABLE: &'static str = sales::ORDER_DETAILS;
    const COLUMNS: &'static [&'static str] =
        &["order_detail_id", "sale_id", "product_id", "quantity"];

    fn bind_values<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.order_detail_id)
            .push_bind(self.sale_id)
            .push_bind(self.product_id)
            .push_bind(self.quantity);
    }
}

/// Insert `rows` into their table inside `tx`.
pub async fn insert_rows<T: InsertRow>(
    tx: &mut Transaction<'_, Sqlite>,
    rows: &[T],
) -> Result<TableLoad, StoreError> {
    let columns = T::COLUMNS
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let mut inserted = 0;

    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("INSERT INTO {} ({}) ", quote_ident(T::TABLE), columns));
        builder.push_values(chunk, |mut row, record| record.bind_values(&mut row));
        let result = builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|err| StoreError::from_write(T::TABLE, err))?;
        inserted += result.rows_affected();
    }

    info!(table = T::TABLE, rows = inserted, "table loaded");
    Ok(TableLoad {
        table: T::TABLE.to_string(),
        rows: inserted,
    })
}

impl SqliteStore {
    /// Insert customers, suppliers, employees and products and commit.
    pub async fn load_base(&mut self, base: &BaseTables) -> Result<Vec<TableLoad>, StoreError> {
        let mut tx = self.pool().begin().await.map_err(StoreError::Unreachable)?;
        let loads = vec![
            insert_rows(&mut tx, &base.customers).await?,
            insert_rows(&mut tx, &base.suppliers).await?,
            insert_rows(&mut tx, &base.employees).await?,
            insert_rows(&mut tx, &base.products).await?,
        ];
        tx.commit().await.map_err(StoreError::from_sqlx)?;
        Ok(loads)
    }

    /// Insert sales and their line items and commit.
    pub async fn load_orders(&mut self, orders: &Orders) -> Result<Vec<TableLoad>, StoreError> {
        let mut tx = self.pool().begin().await.map_err(StoreError::Unreachable)?;
        let loads = vec![
            insert_rows(&mut tx, &orders.sales).await?,
            insert_rows(&mut tx, &orders.line_items).await?,
        ];
        tx.commit().await.map_err(StoreError::from_sqlx)?;
        Ok(loads)
    }

    /// Read every committed product price in one query.
    pub async fn load_price_table(&self) -> Result<PriceTable, StoreError> {
        let rows: Vec<(i64, f64)> = sqlx::query_as(&format!(
            "SELECT product_id, price FROM {} ORDER BY product_id",
            quote_ident(sales::PRODUCTS)
        ))
        .fetch_all(self.pool())
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(PriceTable::from_prices(rows))
    }
}
