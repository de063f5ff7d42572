use std::collections::{BTreeMap, BTreeSet};

use crate::constraints::Constraint;
use crate::error::{Error, Result};
use crate::schema::DatasetSchema;

/// Validate internal consistency of a dataset schema.
///
/// This checks:
/// - duplicate tables/columns
/// - every table declares exactly one primary key
/// - primary key and unique columns exist
/// - foreign key columns and referenced targets exist
pub fn validate_schema(schema: &DatasetSchema) -> Result<()> {
    let mut catalog: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for table in &schema.tables {
        if catalog.contains_key(&table.name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.clone()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.name, column.name
                )));
            }
        }

        catalog.insert(table.name.clone(), columns);
    }

    for table in &schema.tables {
        let columns = catalog.get(&table.name).ok_or_else(|| {
            Error::InvalidSchema(format!("missing table in catalog: {}", table.name))
        })?;

        let primary_keys = table
            .constraints
            .iter()
            .filter(|constraint| matches!(constraint, Constraint::PrimaryKey(_)))
            .count();
        if primary_keys != 1 {
            return Err(Error::InvalidSchema(format!(
                "table {} declares {} primary keys, expected 1",
                table.name, primary_keys
            )));
        }

        for constraint in &table.constraints {
            match constraint {
                Constraint::PrimaryKey(pk) => {
                    for column in &pk.columns {
                        if !columns.contains(column) {
                            return Err(Error::InvalidSchema(format!(
                                "primary key column not found: {}.{}",
                                table.name, column
                            )));
                        }
                    }
                }
                Constraint::ForeignKey(fk) => {
                    for column in &fk.columns {
                        if !columns.contains(column) {
                            return Err(Error::InvalidSchema(format!(
                                "foreign key column not found: {}.{}",
                                table.name, column
                            )));
                        }
                    }

                    let ref_columns = catalog.get(&fk.referenced_table).ok_or_else(|| {
                        Error::InvalidSchema(format!(
                            "referenced table not found: {}",
                            fk.referenced_table
                        ))
                    })?;

                    if fk.columns.len() != fk.referenced_columns.len() {
                        return Err(Error::InvalidSchema(format!(
                            "foreign key on {} maps {} column(s) to {} referenced column(s)",
                            table.name,
                            fk.columns.len(),
                            fk.referenced_columns.len()
                        )));
                    }

                    for column in &fk.referenced_columns {
                        if !ref_columns.contains(column) {
                            return Err(Error::InvalidSchema(format!(
                                "referenced column not found: {}.{}",
                                fk.referenced_table, column
                            )));
                        }
                    }
                }
                Constraint::Unique(unique) => {
                    for column in &unique.columns {
                        if !columns.contains(column) {
                            return Err(Error::InvalidSchema(format!(
                                "unique column not found: {}.{}",
                                table.name, column
                            )));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
