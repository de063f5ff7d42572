mod registry;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use uuid::Uuid;

use registry::{RunContext, init_logging, start_run, write_audit, write_generation_report};
use salesforge_core::{SCHEMA_VERSION, sales_schema};
use salesforge_eval::{AuditEngine, AuditOptions, EvalError};
use salesforge_generate::{GenerateOptions, GenerationEngine, LocaleKey};
use salesforge_store::{PopulateError, SqliteStore, StoreError, populate};
use settings::{DEFAULT_SETTINGS_FILE, Settings, SettingsError, load_settings};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("population error: {0}")]
    Populate(#[from] PopulateError),
    #[error("audit error: {0}")]
    Eval(#[from] EvalError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "salesforge", version, about = "Synthetic sales database CLI")]
struct Cli {
    /// Settings file.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Database file or `sqlite:` URL (overrides the settings file).
    #[arg(long, global = true)]
    database: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recreate the schema and load a fresh synthetic dataset.
    Init(InitArgs),
    /// Run one SQL statement without persisting changes.
    Query(QueryArgs),
    /// Print every table with its columns and sample rows.
    Describe(DescribeArgs),
    /// Check the stored dataset against its invariants.
    Audit(AuditArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    customers: Option<u64>,
    #[arg(long)]
    suppliers: Option<u64>,
    #[arg(long)]
    employees: Option<u64>,
    #[arg(long)]
    products: Option<u64>,
    #[arg(long)]
    sales: Option<u64>,
    /// Last day of the sale-date window (YYYY-MM-DD); defaults to today.
    #[arg(long, value_name = "DATE")]
    base_date: Option<NaiveDate>,
    #[arg(long)]
    locale: Option<LocaleKey>,
    /// Directory for run artifacts.
    #[arg(long)]
    run_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// SQL statement to execute.
    sql: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct DescribeArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// Exit with an error when any check fails.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Skip comparing row counts with the configured generation counts.
    #[arg(long, default_value_t = false)]
    no_expected_counts: bool,
    #[arg(long, default_value_t = 20)]
    max_examples: usize,
    #[arg(long)]
    run_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(database) = cli.database {
        settings.database.database = database;
    }

    match cli.command {
        Command::Init(args) => run_init(settings, args).await,
        Command::Query(args) => run_query(settings, args).await,
        Command::Describe(args) => run_describe(settings, args).await,
        Command::Audit(args) => run_audit(settings, args).await,
    }
}

async fn run_init(mut settings: Settings, args: InitArgs) -> Result<(), CliError> {
    let generation = &mut settings.generation;
    let counts = &mut generation.counts;
    for (value, target) in [
        (args.customers, &mut counts.customers),
        (args.suppliers, &mut counts.suppliers),
        (args.employees, &mut counts.employees),
        (args.products, &mut counts.products),
        (args.sales, &mut counts.sales),
    ] {
        if let Some(value) = value {
            *target = value;
        }
    }
    if let Some(seed) = args.seed {
        generation.seed = seed;
    }
    if let Some(locale) = args.locale {
        generation.locale = locale;
    }
    generation.base_date = args.base_date.or(generation.base_date);
    if let Some(run_dir) = args.run_dir {
        settings.runs.dir = run_dir;
    }

    let ctx = run_context("init", &settings);
    let paths = start_run(&ctx)?;
    init_logging(Some(&paths.logs_path))?;
    tracing::info!(event = "run_started", run_id = %ctx.run_id, command = "init", database = %ctx.database);
    let timer = Instant::now();

    let mut store = SqliteStore::connect(settings.database.clone()).await?;
    let engine = GenerationEngine::new(GenerateOptions {
        run_id: Some(ctx.run_id.clone()),
        ..settings.generation.clone()
    });
    let summary = populate(&mut store, &sales_schema(), &engine).await?;
    write_generation_report(&paths, &summary.report)?;
    tracing::info!(event = "report_written", path = %paths.generation_report_path.display());
    store.close().await;

    let rows: u64 = summary.tables.iter().map(|load| load.rows).sum();
    println!(
        "Database initialized: {rows} rows across {} tables in {} (run {})",
        summary.tables.len(),
        settings.database.database,
        ctx.run_id
    );
    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

async fn run_query(settings: Settings, args: QueryArgs) -> Result<(), CliError> {
    init_logging(None)?;
    let store = SqliteStore::connect(settings.database.existing_only()).await?;
    let outcome = store.execute(&args.sql).await?;
    match args.format {
        OutputFormat::Text => println!("{}", outcome.to_text()),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome.into_response())?)
        }
    }
    store.close().await;
    Ok(())
}

async fn run_describe(settings: Settings, args: DescribeArgs) -> Result<(), CliError> {
    init_logging(None)?;
    let store = SqliteStore::connect(settings.database.existing_only()).await?;
    match args.format {
        OutputFormat::Text => println!("{}", store.describe_schema().await?),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&store.catalog().await?)?)
        }
    }
    store.close().await;
    Ok(())
}

async fn run_audit(mut settings: Settings, args: AuditArgs) -> Result<(), CliError> {
    if let Some(run_dir) = args.run_dir {
        settings.runs.dir = run_dir;
    }
    let ctx = run_context("audit", &settings);
    let paths = start_run(&ctx)?;
    init_logging(Some(&paths.logs_path))?;
    tracing::info!(event = "run_started", run_id = %ctx.run_id, command = "audit", database = %ctx.database);

    let store = SqliteStore::connect(settings.database.clone().existing_only()).await?;
    let schema = sales_schema();
    let expected = (!args.no_expected_counts).then_some(&settings.generation.counts);

    // Strictness is applied after the report is written.
    let engine = AuditEngine::new(AuditOptions {
        strict: false,
        max_examples: args.max_examples,
    });
    let mut report = engine.run(&store, &schema, expected).await?;
    report.schema_fingerprint = Some(store.schema_fingerprint().await?);
    write_audit(&paths, &report, &engine.render(&report))?;
    store.close().await;

    let violations = report.violation_count();
    println!(
        "Audit finished: {violations} violation(s); report at {}",
        paths.audit_report_path.display()
    );
    if args.strict && violations > 0 {
        return Err(EvalError::Violations(violations).into());
    }
    tracing::info!(event = "run_finished", status = "success", violations);
    Ok(())
}

fn run_context(command: &str, settings: &Settings) -> RunContext {
    RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        database: settings.database.database.clone(),
        schema_version: SCHEMA_VERSION.to_string(),
        run_dir: settings.runs.dir.clone(),
        generation: settings.generation.clone(),
    }
}
