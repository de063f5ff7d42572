//! Static definition of the sales dataset schema.

use crate::constraints::{Constraint, ForeignKey, PrimaryKey, UniqueConstraint};
use crate::schema::{Column, DatasetSchema, Table};
use crate::types::ColumnType;
use crate::SCHEMA_VERSION;

pub const CUSTOMERS: &str = "customers";
pub const SUPPLIERS: &str = "suppliers";
pub const EMPLOYEES: &str = "employees";
pub const PRODUCTS: &str = "products";
pub const SALES: &str = "sales";
pub const ORDER_DETAILS: &str = "order_details";

/// Department assigned to every employee in the dataset.
pub const SALES_DEPARTMENT: &str = "Sales";

/// Build the six-table sales schema in declaration order.
pub fn sales_schema() -> DatasetSchema {
    DatasetSchema {
        schema_version: SCHEMA_VERSION.to_string(),
        engine: "sqlite".to_string(),
        tables: vec![
            table(
                CUSTOMERS,
                &[
                    ("customer_id", ColumnType::Integer),
                    ("first_name", ColumnType::Text),
                    ("last_name", ColumnType::Text),
                    ("email", ColumnType::Text),
                    ("city", ColumnType::Text),
                ],
                vec![unique(&["email"])],
            ),
            table(
                SUPPLIERS,
                &[
                    ("supplier_id", ColumnType::Integer),
                    ("supplier_name", ColumnType::Text),
                    ("contact_email", ColumnType::Text),
                ],
                Vec::new(),
            ),
            table(
                EMPLOYEES,
                &[
                    ("employee_id", ColumnType::Integer),
                    ("first_name", ColumnType::Text),
                    ("last_name", ColumnType::Text),
                    ("department", ColumnType::Text),
                ],
                Vec::new(),
            ),
            table(
                PRODUCTS,
                &[
                    ("product_id", ColumnType::Integer),
                    ("product_name", ColumnType::Text),
                    ("category", ColumnType::Text),
                    ("price", ColumnType::Real),
                    ("stock_quantity", ColumnType::Integer),
                    ("supplier_id", ColumnType::Integer),
                ],
                vec![foreign_key("supplier_id", SUPPLIERS, "supplier_id")],
            ),
            table(
                SALES,
                &[
                    ("sale_id", ColumnType::Integer),
                    ("customer_id", ColumnType::Integer),
                    ("employee_id", ColumnType::Integer),
                    ("sale_date", ColumnType::Text),
                    ("total_amount", ColumnType::Real),
                    ("payment_method", ColumnType::Text),
                ],
                vec![
                    foreign_key("customer_id", CUSTOMERS, "customer_id"),
                    foreign_key("employee_id", EMPLOYEES, "employee_id"),
                ],
            ),
            table(
                ORDER_DETAILS,
                &[
                    ("order_detail_id", ColumnType::Integer),
                    ("sale_id", ColumnType::Integer),
                    ("product_id", ColumnType::Integer),
                    ("quantity", ColumnType::Integer),
                ],
                vec![
                    foreign_key("sale_id", SALES, "sale_id"),
                    foreign_key("product_id", PRODUCTS, "product_id"),
                ],
            ),
        ],
    }
}

/// First column is the primary key.
fn table(name: &str, columns: &[(&str, ColumnType)], extra: Vec<Constraint>) -> Table {
    let columns: Vec<Column> = columns
        .iter()
        .enumerate()
        .map(|(idx, (column, column_type))| Column {
            ordinal_position: idx as i16 + 1,
            name: column.to_string(),
            column_type: *column_type,
            is_nullable: false,
        })
        .collect();

    let mut constraints = Vec::with_capacity(extra.len() + 1);
    if let Some(pk) = columns.first() {
        constraints.push(Constraint::PrimaryKey(PrimaryKey {
            columns: vec![pk.name.clone()],
        }));
    }
    constraints.extend(extra);

    Table {
        name: name.to_string(),
        comment: None,
        columns,
        constraints,
    }
}

fn unique(columns: &[&str]) -> Constraint {
    Constraint::Unique(UniqueConstraint {
        columns: columns.iter().map(|column| column.to_string()).collect(),
    })
}

fn foreign_key(column: &str, referenced_table: &str, referenced_column: &str) -> Constraint {
    Constraint::ForeignKey(ForeignKey {
        columns: vec![column.to_string()],
        referenced_table: referenced_table.to_string(),
        referenced_columns: vec![referenced_column.to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::creation_order;

    #[test]
    fn creation_order_puts_parents_first() {
        let order = creation_order(&sales_schema()).expect("acyclic");
        assert_eq!(
            order,
            vec![CUSTOMERS, SUPPLIERS, EMPLOYEES, PRODUCTS, SALES, ORDER_DETAILS]
        );
    }

    #[test]
    fn every_table_keys_on_its_first_column() {
        for table in sales_schema().tables {
            let pk = table.primary_key().expect("primary key");
            assert_eq!(pk.columns, vec![table.columns[0].name.clone()]);
        }
    }
}
