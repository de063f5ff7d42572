//! DDL rendering for the declared schema.

use salesforge_core::Table;

/// Quote an identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn drop_table(table: &Table) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(&table.name))
}

/// `CREATE TABLE` with primary key, unique and foreign key clauses.
pub fn create_table(table: &Table) -> String {
    let mut lines: Vec<String> = table
        .ordered_columns()
        .into_iter()
        .map(|column| {
            let mut line = format!("  {} {}", quote_ident(&column.name), column.column_type);
            if !column.is_nullable {
                line.push_str(" NOT NULL");
            }
            line
        })
        .collect();

    if let Some(pk) = table.primary_key() {
        lines.push(format!("  PRIMARY KEY ({})", quote_list(&pk.columns)));
    }
    for unique in table.unique_constraints() {
        lines.push(format!("  UNIQUE ({})", quote_list(&unique.columns)));
    }
    for fk in table.foreign_keys() {
        lines.push(format!(
            "  FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_list(&fk.columns),
            quote_ident(&fk.referenced_table),
            quote_list(&fk.referenced_columns)
        ));
    }

    format!(
        "CREATE TABLE {} (\n{}\n)",
        quote_ident(&table.name),
        lines.join(",\n")
    )
}

#[cfg(test)]
mod tests {
    use salesforge_core::sales_schema;

    use super::*;

    #[test]
    fn renders_products_table() {
        let schema = sales_schema();
        let products = schema.table("products").expect("products");
        assert_eq!(
            create_table(products),
            "CREATE TABLE \"products\" (\n  \"product_id\" INTEGER NOT NULL,\n  \"product_name\" TEXT NOT NULL,\n  \"category\" TEXT NOT NULL,\n  \"price\" REAL NOT NULL,\n  \"stock_quantity\" INTEGER NOT NULL,\n  \"supplier_id\" INTEGER NOT NULL,\n  PRIMARY KEY (\"product_id\"),\n  FOREIGN KEY (\"supplier_id\") REFERENCES \"suppliers\" (\"supplier_id\")\n)"
        );
    }

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
