use crate::metrics::AuditReport;

/// Render a deterministic markdown report.
pub fn render_report(report: &AuditReport, max_examples: usize) -> String {
    let mut lines = Vec::new();

    lines.push("# Salesforge Audit Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- engine: {}", report.engine));
    lines.push(format!("- schema_version: {}", report.schema_version));
    if let Some(fingerprint) = &report.schema_fingerprint {
        lines.push(format!("- schema_fingerprint: {fingerprint}"));
    }
    lines.push(String::new());

    lines.push("## Row counts".to_string());
    lines.push("| table | rows_expected | rows_found |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for table in &report.tables {
        let expected = table
            .rows_expected
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "| {} | {} | {} |",
            table.table, expected, table.rows_found
        ));
    }
    lines.push(String::new());

    lines.push("## Checks".to_string());
    lines.push("| check | checked | violations |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for (name, stats) in report.checks.entries() {
        lines.push(format!("| {} | {} | {} |", name, stats.checked, stats.violations));
    }
    lines.push(String::new());

    if !report.violations.is_empty() {
        lines.push("## Top violations".to_string());
        for violation in report.violations.iter().take(max_examples) {
            let example = violation
                .example
                .as_ref()
                .map(|value| format!(" example={value}"))
                .unwrap_or_default();
            lines.push(format!(
                "- {} [{}]: {}{}",
                violation.path, violation.code, violation.message, example
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(report));
    lines.join("\n")
}

fn recommendations(report: &AuditReport) -> Vec<String> {
    let checks = &report.checks;
    let mut lines = Vec::new();
    if checks.fk.violations > 0 {
        lines.push("- load parent tables before the tables that reference them.".to_string());
    }
    if checks.totals.violations > 0 {
        lines.push("- recompute sale totals from the committed product prices.".to_string());
    }
    if checks.dense_ids.violations > 0 || checks.line_item_ids.violations > 0 {
        lines.push("- reinstall the schema before loading so ids restart at 1.".to_string());
    }
    if checks.row_counts.violations > 0 {
        lines.push("- compare the generation options with the expected counts.".to_string());
    }
    if report.violations.is_empty() {
        lines.push("- no violations detected; compare audits across runs for drift.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{AUDIT_VERSION, CheckStats, CheckSummary, TableMetrics};
    use crate::engine::AuditEngine;
    use crate::model::{AuditOptions, Violation};

    fn report(violations: Vec<Violation>) -> AuditReport {
        AuditReport {
            audit_version: AUDIT_VERSION.to_string(),
            engine: "sqlite".to_string(),
            schema_version: "0.1".to_string(),
            schema_fingerprint: None,
            tables: vec![TableMetrics {
                table: "customers".to_string(),
                rows_found: 3,
                rows_expected: Some(3),
            }],
            checks: CheckSummary {
                totals: CheckStats {
                    checked: 1,
                    violations: violations.len() as u64,
                },
                ..CheckSummary::default()
            },
            violations,
            duration_ms: 0,
        }
    }

    #[test]
    fn clean_report_recommends_drift_tracking() {
        let text = render_report(&report(Vec::new()), 10);
        assert!(text.contains("| customers | 3 | 3 |"));
        assert!(text.contains("| totals | 1 | 0 |"));
        assert!(!text.contains("## Top violations"));
        assert!(text.ends_with("compare audits across runs for drift."));
    }

    #[test]
    fn violations_are_listed_up_to_limit() {
        let violation = |n: u64| Violation {
            code: "total_mismatch".to_string(),
            path: "sales.total_amount".to_string(),
            message: format!("{n} sale(s) disagree with their line items"),
            count: n,
            example: Some(format!("sale_id={n}")),
        };
        let text = render_report(&report(vec![violation(1), violation(2)]), 1);
        assert!(text.contains("- sales.total_amount [total_mismatch]: 1 sale(s) disagree with their line items example=sale_id=1"));
        assert!(!text.contains("sale_id=2"));
        assert!(text.contains("recompute sale totals"));
    }

    #[test]
    fn audit_engine_renders_with_its_example_limit() {
        let violation = |n: u64| Violation {
            code: "orphan".to_string(),
            path: format!("order_details.fk_{n}"),
            message: format!("{n} orphan row(s)"),
            count: n,
            example: None,
        };
        let report = report(vec![violation(1), violation(2), violation(3)]);

        let engine = AuditEngine::new(AuditOptions {
            max_examples: 2,
            ..AuditOptions::default()
        });
        let text = engine.render(&report);
        assert!(text.contains("order_details.fk_2"));
        assert!(!text.contains("order_details.fk_3"));
        assert_eq!(AuditEngine::default().render(&report).matches("[orphan]").count(), 3);
    }
}
