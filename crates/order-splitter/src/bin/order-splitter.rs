//! CLI binary for order-splitter.
//!
//! Reads the mapping sheet and the orders PDF from disk, runs the pipeline
//! and prints the run summary.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use order_splitter::config::{load_config, validate_config, Config, OverwritePolicy};
use order_splitter::pipeline::{Pipeline, PipelineConfig, RunOutcome, RunReport, TracingProgress};
use order_splitter::storage::parse_run_date;

/// Exit code for a run where no page matched any SKU.
const EXIT_NO_MATCHES: u8 = 2;

/// Split a purchase-order PDF into one PDF per vendor.
#[derive(Parser, Debug)]
#[command(
    name = "order-splitter",
    version,
    about = "Split a purchase-order PDF into one PDF per vendor using a SKU lookup sheet"
)]
struct Cli {
    /// SKU to vendor mapping sheet (XLSX or CSV).
    #[arg(long)]
    sheet: PathBuf,

    /// Purchase-order PDF, one order line per page.
    #[arg(long)]
    orders: PathBuf,

    /// JSON config file. Built-in defaults apply when omitted.
    #[arg(long, env = "ORDER_SPLITTER_CONFIG")]
    config: Option<PathBuf>,

    /// Root directory for dated output folders.
    #[arg(long, env = "ORDER_SPLITTER_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    /// Directory holding the audit CSV and the error log.
    #[arg(long, env = "ORDER_SPLITTER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Store label used in file names and the Store column.
    #[arg(long)]
    label: Option<String>,

    /// last-write-wins or fail-on-conflict.
    #[arg(long)]
    overwrite: Option<OverwritePolicy>,

    /// Run date as M-D-YYYY. Defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_run_date(value).ok_or_else(|| format!("expected M-D-YYYY, got '{}'", value))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs)?;

    let config = resolve_config(&cli)?;
    let pipeline = Pipeline::from_config(Arc::new(PipelineConfig::from_config(&config)));

    let sheet_bytes = std::fs::read(&cli.sheet)
        .with_context(|| format!("Failed to read mapping sheet {}", cli.sheet.display()))?;
    let pdf_bytes = std::fs::read(&cli.orders)
        .with_context(|| format!("Failed to read orders PDF {}", cli.orders.display()))?;
    let run_date = cli.date.unwrap_or_else(|| Local::now().date_naive());

    let outcome = pipeline
        .run(&sheet_bytes, &pdf_bytes, run_date, &TracingProgress)
        .context("Order split failed")?;

    match outcome {
        RunOutcome::Prepared(report) => {
            print_report(&report);
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::NoMatchedPages {
            errors,
            error_log_path,
        } => {
            eprintln!(
                "No page matched any SKU ({} pages). Details appended to {}",
                errors.len(),
                error_log_path.display()
            );
            Ok(ExitCode::from(EXIT_NO_MATCHES))
        }
        RunOutcome::EmptyDocument => {
            eprintln!("The orders PDF has no pages, nothing to do.");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if json {
        Box::new(
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .finish(),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .finish(),
        )
    };
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    // lopdf reports through the `log` facade.
    tracing_log::LogTracer::init().context("Failed to bridge log records")?;
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(root) = &cli.output_root {
        config.output_root = root.display().to_string();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.display().to_string();
    }
    if let Some(label) = &cli.label {
        config.store_label = label.trim().to_string();
    }
    if let Some(policy) = cli.overwrite {
        config.overwrite = policy;
    }

    validate_config(&config).context("Invalid command-line overrides")?;
    Ok(config)
}

fn print_report(report: &RunReport) {
    println!("Run date:   {}", report.run_date);
    println!("Vendors:    {}", report.vendor_count());
    println!(
        "Pages:      {} of {} matched",
        report.matched_pages, report.total_pages
    );
    println!("Errors:     {}", report.error_count());
    println!();

    let headers = ["Store", "Vendor", "Pages", "PDF"];
    let rows: Vec<[String; 4]> = report
        .summary_records
        .iter()
        .map(|r| {
            [
                r.store.clone(),
                r.vendor.clone(),
                r.pages.to_string(),
                r.pdf_filename.clone(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 4]| {
        format!(
            "{:<w0$}  {:<w1$}  {:>w2$}  {:<w3$}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        )
    };
    println!("{}", line(headers).trim_end());
    for row in &rows {
        let cells = [
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
        ];
        println!("{}", line(cells).trim_end());
    }

    println!();
    println!("Zip:        {}", report.zip_path.display());
    println!("Summary:    {}", report.summary_path.display());
    println!(
        "Audit log:  {} ({} rows)",
        report.audit_log_path.display(),
        report.audit_rows
    );
    if let Some(path) = &report.error_log_path {
        println!("Error log:  {}", path.display());
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}
