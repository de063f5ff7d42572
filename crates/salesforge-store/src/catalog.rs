//! Schema and sample-row reporting for the live database.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ddl::quote_ident;
use crate::error::StoreError;
use crate::gateway::{QueryResult, decode_row};
use crate::store::SqliteStore;

/// Rows shown per table in the catalog.
pub const SAMPLE_ROWS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub name: String,
    pub columns: Vec<CatalogColumn>,
    pub sample: QueryResult,
}

/// Every user table in creation order with up to [`SAMPLE_ROWS`] rows each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogReport {
    pub tables: Vec<CatalogTable>,
}

impl CatalogReport {
    pub fn table(&self, name: &str) -> Option<&CatalogTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// One `Table:` block and one `Sample data for` block per table.
    pub fn render(&self) -> String {
        let mut blocks = Vec::with_capacity(self.tables.len() * 2);
        for table in &self.tables {
            let mut structure = format!("Table: {}\n", table.name);
            for column in &table.columns {
                structure.push_str(&format!("- {} ({})\n", column.name, column.declared_type));
            }
            blocks.push(structure);
            blocks.push(format!(
                "Sample data for {}:\n{}\n",
                table.name,
                table.sample.to_text()
            ));
        }
        blocks.join("\n")
    }
}

/// SHA-256 over table names, column names and declared types.
pub fn fingerprint<'a, I>(tables: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a [CatalogColumn])>,
{
    let mut hasher = Sha256::new();
    for (table, columns) in tables {
        hasher.update(table.as_bytes());
        hasher.update(b"\n");
        for column in columns {
            hasher.update(column.name.as_bytes());
            hasher.update(b"\t");
            hasher.update(column.declared_type.as_bytes());
            hasher.update(b"\n");
        }
    }
    hex::encode(hasher.finalize())
}

impl SqliteStore {
    /// Structured catalog with sample rows.
    pub async fn catalog(&self) -> Result<CatalogReport, StoreError> {
        let mut tables = Vec::new();
        for name in self.table_names().await? {
            let columns = self.table_columns(&name).await?;
            let sample = self.sample_rows(&name, &columns).await?;
            tables.push(CatalogTable {
                name,
                columns,
                sample,
            });
        }
        Ok(CatalogReport { tables })
    }

    /// Text description of every table: columns with declared types and sample rows.
    pub async fn describe_schema(&self) -> Result<String, StoreError> {
        Ok(self.catalog().await?.render())
    }

    /// Fingerprint of the current table structure, ignoring stored rows.
    pub async fn schema_fingerprint(&self) -> Result<String, StoreError> {
        let mut structure = Vec::new();
        for name in self.table_names().await? {
            let columns = self.table_columns(&name).await?;
            structure.push((name, columns));
        }
        Ok(fingerprint(
            structure
                .iter()
                .map(|(name, columns)| (name.as_str(), columns.as_slice())),
        ))
    }

    async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY rowid",
        )
        .fetch_all(self.pool())
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<CatalogColumn>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(self.pool())
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(rows
            .into_iter()
            .map(|(name, declared_type)| CatalogColumn {
                name,
                declared_type,
            })
            .collect())
    }

    async fn sample_rows(
        &self,
        table: &str,
        columns: &[CatalogColumn],
    ) -> Result<QueryResult, StoreError> {
        let sql = format!("SELECT * FROM {} LIMIT {SAMPLE_ROWS}", quote_ident(table));
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(StoreError::from_sqlx)?;
        let rows = rows
            .iter()
            .map(|row| decode_row(row, columns.len()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from_sqlx)?;

        Ok(QueryResult {
            columns: columns.iter().map(|column| column.name.clone()).collect(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScalarValue;

    fn column(name: &str, declared_type: &str) -> CatalogColumn {
        CatalogColumn {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
        }
    }

    #[test]
    fn renders_blocks_per_table() {
        let report = CatalogReport {
            tables: vec![CatalogTable {
                name: "employees".to_string(),
                columns: vec![column("employee_id", "INTEGER"), column("department", "TEXT")],
                sample: QueryResult {
                    columns: vec!["employee_id".to_string(), "department".to_string()],
                    rows: vec![vec![ScalarValue::Integer(1), ScalarValue::Text("Sales".to_string())]],
                },
            }],
        };
        assert_eq!(
            report.render(),
            "Table: employees\n- employee_id (INTEGER)\n- department (TEXT)\n\n\
             Sample data for employees:\nemployee_id department\n          1      Sales\n"
        );
    }

    #[test]
    fn fingerprint_tracks_structure() {
        let columns = vec![column("id", "INTEGER")];
        let renamed = vec![column("id", "TEXT")];
        let base = fingerprint([("t", columns.as_slice())]);
        assert_eq!(base, fingerprint([("t", columns.as_slice())]));
        assert_ne!(base, fingerprint([("t", renamed.as_slice())]));
        assert_eq!(base.len(), 64);
    }
}
