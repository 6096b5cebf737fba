//! querylog CLI - mirror a warehouse catalog and mine table usage
//!
//! Usage:
//!   querylog mirror [--output <dir>] [--dataset-filter <re>] [--table-filter <re>]
//!   querylog usage [--tables-dir <dir>] [--lookback-days <n>]
//!   querylog run <file.sql> [--output-file <path>] [--force]
//!
//! Examples:
//!   querylog mirror --output tables --dataset-filter '^prod_'
//!   querylog usage --tables-dir tables --lookback-days 30
//!   querylog run reports/traffic.sql --output-file out/traffic.csv

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use querylog::config::Settings;
use querylog::mirror::{self, MirrorOptions, PreviewWrite};
use querylog::runner::{self, RunOutcome, RunnerOptions, StdinConfirm};
use querylog::usage;
use querylog::warehouse::{CatalogFilters, Warehouse, WorkerWarehouse};
use querylog::worker::WorkerClient;

#[derive(Parser)]
#[command(name = "querylog")]
#[command(about = "Mirror a warehouse schema registry and mine per-table usage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or refresh the catalog mirror
    Mirror {
        /// Root directory for the mirrored tree
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip fetching preview data
        #[arg(long)]
        skip_preview: bool,

        /// Maximum number of rows per preview
        #[arg(long)]
        max_preview_rows: Option<u32>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Mine the audit log and write usage artifacts
    Usage {
        /// Directory where the mirrored tree exists
        #[arg(short, long)]
        tables_dir: Option<PathBuf>,

        /// Number of days of job history to mine
        #[arg(long)]
        lookback_days: Option<u32>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Execute a SQL file with a pre-flight cost estimate
    Run {
        /// Path to the SQL file to execute
        sql_file: PathBuf,

        /// Output file path (format by extension: .json, .csv)
        #[arg(long)]
        output_file: Option<PathBuf>,

        /// Skip cost validation and execute directly
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        scope: ScopeArgs,
    },
}

/// Warehouse scope and filter flags shared by all subcommands.
/// Flags override querylog.toml.
#[derive(clap::Args)]
struct ScopeArgs {
    /// Billing / query-execution project
    #[arg(long)]
    project_id: Option<String>,

    /// Regional execution scope (e.g., 'eu', 'us')
    #[arg(long)]
    region: Option<String>,

    /// Regex pattern to filter datasets (e.g., '^(staging|prod)_.*')
    #[arg(long)]
    dataset_filter: Option<String>,

    /// Regex pattern to filter tables (e.g., '^fact_.*')
    #[arg(long)]
    table_filter: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Mirror {
            output,
            skip_preview,
            max_preview_rows,
            scope,
        } => cmd_mirror(output, skip_preview, max_preview_rows, scope).await,
        Commands::Usage {
            tables_dir,
            lookback_days,
            scope,
        } => cmd_usage(tables_dir, lookback_days, scope).await,
        Commands::Run {
            sql_file,
            output_file,
            force,
            scope,
        } => cmd_run(sql_file, output_file, force, scope).await,
    }
}

/// Load settings, apply scope overrides, and connect the worker.
async fn connect(scope: &ScopeArgs) -> Result<(Settings, Arc<dyn Warehouse>), String> {
    let mut settings = Settings::load().map_err(|e| format!("config error: {e}"))?;

    if let Some(project_id) = &scope.project_id {
        settings.warehouse.project_id = Some(project_id.clone());
    }
    if let Some(region) = &scope.region {
        settings.warehouse.region = region.clone();
    }
    if let Some(pattern) = &scope.dataset_filter {
        settings.filters.dataset_regex = Some(pattern.clone());
    }
    if let Some(pattern) = &scope.table_filter {
        settings.filters.table_regex = Some(pattern.clone());
    }

    let project_id = settings
        .resolved_project_id()
        .map_err(|e| format!("config error: {e}"))?;

    let client = WorkerClient::spawn_with_settings(&settings)
        .await
        .map_err(|e| format!("worker error: {e}"))?;

    let warehouse = WorkerWarehouse::with_client(client, project_id, settings.warehouse.region.clone());

    println!(
        "Connected to warehouse (project: {}, region: {})",
        warehouse.project_id(),
        warehouse.region()
    );

    Ok((settings, Arc::new(warehouse)))
}

fn build_filters(settings: &Settings) -> Result<CatalogFilters, String> {
    if let Some(pattern) = settings.dataset_filter() {
        println!("Using dataset filter regex: {pattern}");
    }
    if let Some(pattern) = settings.table_filter() {
        println!("Using table filter regex: {pattern}");
    }

    CatalogFilters::from_patterns(settings.dataset_filter(), settings.table_filter())
        .map_err(|e| format!("invalid filter regex: {e}"))
}

async fn cmd_mirror(
    output: Option<PathBuf>,
    skip_preview: bool,
    max_preview_rows: Option<u32>,
    scope: ScopeArgs,
) -> ExitCode {
    let (settings, warehouse) = match connect(&scope).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filters = match build_filters(&settings) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = MirrorOptions {
        root: output.unwrap_or_else(|| PathBuf::from(&settings.mirror.output_dir)),
        enable_preview: !skip_preview,
        max_preview_rows: max_preview_rows.unwrap_or(settings.mirror.max_preview_rows),
        fetch_workers: settings.mirror.fetch_workers,
    };

    if skip_preview {
        println!("Preview fetching disabled; refreshing definitions only");
    }

    match mirror::build_mirror(warehouse, &filters, &options).await {
        Ok(report) => {
            for outcome in &report.outcomes {
                match &outcome.write {
                    PreviewWrite::Fetched => println!("Fetched preview: {}", outcome.table),
                    PreviewWrite::ErrorMarked(reason) => {
                        println!("Preview failed (marked for retry): {}: {}", outcome.table, reason)
                    }
                    PreviewWrite::Failed(reason) => {
                        println!("Preview write failed: {}: {}", outcome.table, reason)
                    }
                }
            }
            println!();
            println!(
                "Completed: {} tables ({} created, {} updated, {} skipped, {} errored)",
                report.tables,
                report.sync.created,
                report.sync.updated,
                report.sync.skipped,
                report.sync.errored
            );
            println!(
                "Previews: {} fetched, {} error-marked, {} failed",
                report.fetch.fetched, report.fetch.error_marked, report.fetch.failed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Mirror build failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn cmd_usage(
    tables_dir: Option<PathBuf>,
    lookback_days: Option<u32>,
    scope: ScopeArgs,
) -> ExitCode {
    let (settings, warehouse) = match connect(&scope).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filters = match build_filters(&settings) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let root = tables_dir.unwrap_or_else(|| PathBuf::from(&settings.mirror.output_dir));
    let lookback = lookback_days.unwrap_or(settings.usage.lookback_days);
    println!("Mining {lookback} days of job history");

    match usage::mine_usage(warehouse, &filters, &root, lookback).await {
        Ok(report) => {
            println!();
            println!(
                "Completed: {} jobs over {} tables ({} usage files written, {} skipped, {} errored)",
                report.jobs,
                report.records,
                report.write.written,
                report.write.missing_dir,
                report.write.errored
            );
            println!("Leaderboard: {} tables ranked", report.ranked);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Usage mining failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn cmd_run(
    sql_file: PathBuf,
    output_file: Option<PathBuf>,
    force: bool,
    scope: ScopeArgs,
) -> ExitCode {
    let (_settings, warehouse) = match connect(&scope).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Reading SQL query from: {}", sql_file.display());

    let options = RunnerOptions { force, output_file };
    let mut confirm = StdinConfirm;

    match runner::run_query_file(warehouse.as_ref(), &sql_file, &options, &mut confirm).await {
        Ok(RunOutcome::Declined { estimate }) => {
            println!(
                "Query execution cancelled ({:.2} GB estimated)",
                estimate.gigabytes()
            );
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Completed(summary)) => {
            if let Some(estimate) = &summary.estimate {
                println!(
                    "Estimated: {:.2} GB (~${:.4})",
                    estimate.gigabytes(),
                    estimate.cost_usd(runner::PRICE_PER_TB_USD)
                );
            }
            if summary.degraded {
                println!("Note: bulk retrieval unavailable; used paged retrieval");
            }
            println!(
                "Retrieved {} rows, {} columns ({})",
                summary.rows,
                summary.columns.len(),
                summary.columns.join(", ")
            );
            if let Some(path) = &summary.results_path {
                println!("Results saved to: {}", path.display());
            }
            match &summary.diagnostics_path {
                Some(path) => println!("Query plan and statistics saved to: {}", path.display()),
                None => println!("Warning: diagnostics could not be written"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Query run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
