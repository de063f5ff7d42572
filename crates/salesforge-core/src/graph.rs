use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DatasetSchema;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a dataset schema.
///
/// Referenced tables come before the tables that reference them; tables
/// that become ready at the same time keep their declaration order.
pub fn build_fk_graph_report(schema: &DatasetSchema) -> FkGraphReport {
    let (names, graph) = build_adjacency(schema);
    let nodes = names.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&names, &graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

/// Table names in the order they must be created.
///
/// Drop order is the reverse of this.
pub fn creation_order(schema: &DatasetSchema) -> Result<Vec<String>> {
    let report = build_fk_graph_report(schema);
    match (report.topo_order, report.cycle) {
        (Some(order), _) => Ok(order),
        (None, Some(cycle)) => Err(Error::InvalidSchema(format!(
            "foreign key cycle between: {}",
            cycle.join(", ")
        ))),
        (None, None) => Err(Error::InvalidSchema(
            "foreign key graph could not be ordered".to_string(),
        )),
    }
}

/// Node names by declaration index plus parent -> children edges.
fn build_adjacency(schema: &DatasetSchema) -> (Vec<String>, BTreeMap<usize, BTreeSet<usize>>) {
    let mut names: Vec<String> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut graph: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();

    let mut intern = |name: &str, names: &mut Vec<String>| -> usize {
        if let Some(idx) = index.get(name) {
            return *idx;
        }
        let idx = names.len();
        names.push(name.to_string());
        index.insert(name.to_string(), idx);
        idx
    };

    for table in &schema.tables {
        let child = intern(&table.name, &mut names);
        graph.entry(child).or_default();

        for fk in table.foreign_keys() {
            let parent = intern(&fk.referenced_table, &mut names);
            graph.entry(parent).or_default().insert(child);
        }
    }

    (names, graph)
}

fn toposort(
    names: &[String],
    graph: &BTreeMap<usize, BTreeSet<usize>>,
) -> std::result::Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<usize, usize> = (0..names.len()).map(|idx| (idx, 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(*target).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .filter_map(|(node, count)| if *count == 0 { Some(*node) } else { None })
        .collect();

    let mut order = Vec::with_capacity(names.len());

    while let Some(node) = ready.pop_first() {
        order.push(names[node].clone());

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(*target);
                    }
                }
            }
        }
    }

    if order.len() == names.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(names[node].clone()) } else { None })
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Constraint, ForeignKey};
    use crate::schema::{Column, Table};
    use crate::types::ColumnType;

    fn column(name: &str) -> Column {
        Column {
            ordinal_position: 1,
            name: name.to_string(),
            column_type: ColumnType::Integer,
            is_nullable: false,
        }
    }

    fn fk(column: &str, parent: &str) -> Constraint {
        Constraint::ForeignKey(ForeignKey {
            columns: vec![column.to_string()],
            referenced_table: parent.to_string(),
            referenced_columns: vec!["id".to_string()],
        })
    }

    fn table(name: &str, constraints: Vec<Constraint>) -> Table {
        Table {
            name: name.to_string(),
            comment: None,
            columns: vec![column("id")],
            constraints,
        }
    }

    fn schema(tables: Vec<Table>) -> DatasetSchema {
        DatasetSchema {
            schema_version: "0.1".to_string(),
            engine: "sqlite".to_string(),
            tables,
        }
    }

    #[test]
    fn toposort_reports_cycle() {
        let schema = schema(vec![table("users", vec![fk("id", "users")])]);

        let report = build_fk_graph_report(&schema);
        assert!(report.topo_order.is_none());
        assert_eq!(report.cycle, Some(vec!["users".to_string()]));
        assert!(creation_order(&schema).is_err());
    }

    #[test]
    fn toposort_orders_dependencies() {
        let schema = schema(vec![
            table("orders", vec![fk("user_id", "users")]),
            table("users", Vec::new()),
        ]);

        let order = creation_order(&schema).expect("expected toposort");
        assert_eq!(order, vec!["users".to_string(), "orders".to_string()]);
    }

    #[test]
    fn independent_tables_keep_declaration_order() {
        let schema = schema(vec![
            table("zebras", Vec::new()),
            table("apples", Vec::new()),
            table("keepers", vec![fk("zebra_id", "zebras")]),
        ]);

        let report = build_fk_graph_report(&schema);
        assert_eq!(report.summary.nodes, 3);
        assert_eq!(report.summary.edges, 1);
        assert_eq!(
            report.topo_order,
            Some(vec![
                "zebras".to_string(),
                "apples".to_string(),
                "keepers".to_string()
            ])
        );
    }
}
