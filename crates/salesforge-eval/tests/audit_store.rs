use anyhow::Result;
use chrono::NaiveDate;

use salesforge_core::sales_schema;
use salesforge_eval::{AuditEngine, AuditOptions, EvalError, audit, render_report};
use salesforge_generate::{EntityCounts, GenerateOptions, GenerationEngine};
use salesforge_store::{SqliteStore, StoreOptions, populate};

fn counts() -> EntityCounts {
    EntityCounts {
        customers: 60,
        suppliers: 6,
        employees: 5,
        products: 30,
        sales: 80,
    }
}

async fn populated_store(options: StoreOptions) -> Result<SqliteStore> {
    let mut store = SqliteStore::connect(options).await?;
    let engine = GenerationEngine::new(GenerateOptions {
        seed: 77,
        counts: counts(),
        base_date: NaiveDate::from_ymd_opt(2025, 5, 1),
        ..GenerateOptions::default()
    });
    populate(&mut store, &sales_schema(), &engine).await?;
    Ok(store)
}

#[tokio::test]
async fn clean_population_passes_every_check() -> Result<()> {
    let store = populated_store(StoreOptions::in_memory()).await?;
    let report = audit(&store, &sales_schema(), Some(&counts())).await?;

    assert!(report.is_clean(), "violations: {:?}", report.violations);
    assert_eq!(report.tables.len(), 6);
    assert_eq!(report.checks.row_counts.checked, 5);
    assert_eq!(report.checks.dense_ids.checked, 6);
    assert_eq!(report.checks.fk.checked, 5);
    assert_eq!(report.checks.unique.checked, 1);
    assert_eq!(report.checks.totals.checked, 1);

    let markdown = render_report(&report, 10);
    assert!(markdown.contains("| customers | 60 | 60 |"));
    assert!(markdown.contains("no violations detected"));
    Ok(())
}

#[tokio::test]
async fn corrupted_total_is_reported() -> Result<()> {
    let store = populated_store(StoreOptions::in_memory()).await?;
    sqlx::query("UPDATE sales SET total_amount = total_amount + 1 WHERE sale_id = 1")
        .execute(store.pool())
        .await?;

    let report = audit(&store, &sales_schema(), None).await?;
    assert_eq!(report.checks.totals.violations, 1);
    let violation = &report.violations[0];
    assert_eq!(violation.code, "total_mismatch");
    assert!(violation.example.as_deref().is_some_and(|e| e.starts_with("sale_id=1")));

    let strict = AuditEngine::new(AuditOptions {
        strict: true,
        ..AuditOptions::default()
    });
    let err = strict
        .run(&store, &sales_schema(), None)
        .await
        .expect_err("strict audit fails");
    assert!(matches!(err, EvalError::Violations(1)));
    Ok(())
}

#[tokio::test]
async fn orphans_and_count_drift_are_reported() -> Result<()> {
    let options = StoreOptions {
        foreign_keys: false,
        ..StoreOptions::in_memory()
    };
    let store = populated_store(options).await?;
    sqlx::query("UPDATE order_details SET product_id = 9999 WHERE order_detail_id = 2")
        .execute(store.pool())
        .await?;
    sqlx::query("DELETE FROM customers WHERE customer_id = 60")
        .execute(store.pool())
        .await?;

    let report = audit(&store, &sales_schema(), Some(&counts())).await?;
    assert!(report.checks.fk.violations >= 1);
    assert_eq!(report.checks.row_counts.violations, 1);
    assert!(report
        .violations
        .iter()
        .any(|v| v.code == "fk_orphan" && v.path == "order_details.product_id"));
    Ok(())
}
