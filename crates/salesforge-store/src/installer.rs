use tracing::{debug, info};

use salesforge_core::{DatasetSchema, creation_order, validate_schema};

use crate::ddl;
use crate::error::StoreError;
use crate::store::SqliteStore;

impl SqliteStore {
    /// Drop and recreate every declared table in one transaction.
    ///
    /// Tables are dropped dependents-first and created independents-first, so
    /// running this twice yields the same empty structure.
    pub async fn install(&mut self, schema: &DatasetSchema) -> Result<(), StoreError> {
        validate_schema(schema).map_err(|err| StoreError::InvalidSchema(err.to_string()))?;
        let order =
            creation_order(schema).map_err(|err| StoreError::InvalidSchema(err.to_string()))?;

        let mut tx = self.pool().begin().await.map_err(StoreError::Unreachable)?;

        for name in order.iter().rev() {
            let Some(table) = schema.table(name) else {
                continue;
            };
            sqlx::query(&ddl::drop_table(table))
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;
        }

        for name in &order {
            let Some(table) = schema.table(name) else {
                continue;
            };
            let statement = ddl::create_table(table);
            debug!(table = %name, sql = %statement, "creating table");
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;
        }

        tx.commit().await.map_err(StoreError::from_sqlx)?;
        info!(tables = order.len(), "schema installed");
        Ok(())
    }
}
