//! Command line front end for the mortgage cashflow engine
//!
//! Usage:
//!   mortgage_cashflow run --input loans.json --workers 16 --format csv
//!   mortgage_cashflow smm --cpr 0.06 --wam 360
//!   mortgage_cashflow info

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use mortgage_cashflow::amortization::LoanCashflow;
use mortgage_cashflow::batch::{BatchOrchestrator, WorkerPool};
use mortgage_cashflow::config::ServiceConfig;
use mortgage_cashflow::loan::load_loans;
use mortgage_cashflow::prepayment::cpr_to_smm;
use mortgage_cashflow::service::service_info;
use mortgage_cashflow::store::{InMemoryLoanRepository, JsonFileWriter};
use mortgage_cashflow::logging;

#[derive(Parser, Debug)]
#[command(name = "mortgage_cashflow")]
#[command(about = "Mortgage amortization and prepayment cashflow engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Amortize a batch of loans
    Run {
        /// Loan file (.json array or .csv)
        #[arg(long)]
        input: PathBuf,

        /// Maximum loans computed concurrently (default from config)
        #[arg(long)]
        workers: Option<usize>,

        /// Directory for per-loan cashflow documents
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Write one JSON document per loan
        #[arg(long)]
        persist: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Compute valid loans even when others fail validation
        #[arg(long)]
        partial: bool,
    },

    /// Convert an annual CPR to the single monthly mortality rate
    Smm {
        #[arg(long)]
        cpr: f64,

        /// Term in months; echoed with the rate
        #[arg(long, default_value_t = 360)]
        wam: u32,
    },

    /// Print the service description
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// One CSV output row: a single period of a single loan
#[derive(Debug, Serialize)]
struct PeriodRow<'a> {
    loan_id: &'a str,
    period: u32,
    beg_bal: f64,
    interest: f64,
    principal: f64,
    sched_bal: f64,
    prepayment: f64,
    end_bal: f64,
}

#[derive(Debug, Serialize)]
struct Rejection {
    index: usize,
    loan_id: String,
    error: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            input,
            workers,
            output_dir,
            persist,
            format,
            partial,
        } => {
            let mut config = ServiceConfig::load()?;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            config.persist_results |= persist;
            config.validate()?;

            logging::init_with_file(&config.log_file_path());
            run(&config, &input, format, partial)
        }
        Command::Smm { cpr, wam } => {
            if !(0.0..=1.0).contains(&cpr) {
                bail!("cpr must be between 0 and 1, got {cpr}");
            }
            println!("CPR {:.6} -> SMM {:.8} over {} months", cpr, cpr_to_smm(cpr), wam);
            Ok(())
        }
        Command::Info => {
            println!("{}", serde_json::to_string_pretty(&service_info())?);
            Ok(())
        }
    }
}

fn run(config: &ServiceConfig, input: &Path, format: OutputFormat, partial: bool) -> Result<()> {
    let start = Instant::now();
    let loans = load_loans(input).with_context(|| format!("loading loans from {}", input.display()))?;
    log::info!("Loaded {} loans from {} in {:?}", loans.len(), input.display(), start.elapsed());

    let pool = Arc::new(WorkerPool::new(config.workers)?);
    let mut orchestrator = BatchOrchestrator::new(pool, Arc::new(InMemoryLoanRepository::new()))
        .with_validation(config.validation_options());
    if config.persist_results {
        orchestrator = orchestrator.with_sink(Arc::new(JsonFileWriter::new(&config.output_dir)));
    }

    let (results, rejected) = if partial {
        let mut results = Vec::new();
        let mut rejected = Vec::new();
        for (index, (loan, outcome)) in loans.iter().zip(orchestrator.run_partial(&loans)).enumerate() {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => rejected.push(Rejection {
                    index,
                    loan_id: loan.id.clone(),
                    error: e.to_string(),
                }),
            }
        }
        (results, rejected)
    } else {
        (orchestrator.run(&loans)?, Vec::new())
    };

    match format {
        OutputFormat::Json => write_json(&results, &rejected)?,
        OutputFormat::Csv => {
            write_csv(&results)?;
            for r in &rejected {
                log::warn!("Loan {} ({}) rejected: {}", r.index, r.loan_id, r.error);
            }
        }
    }

    log::info!("Total time: {:?}", start.elapsed());
    Ok(())
}

fn write_json(results: &[LoanCashflow], rejected: &[Rejection]) -> Result<()> {
    let body = serde_json::json!({
        "loan_count": results.len(),
        "local_date": Local::now().to_rfc3339(),
        "results": results,
        "rejected": rejected,
    });
    serde_json::to_writer_pretty(io::stdout().lock(), &body)?;
    println!();
    Ok(())
}

fn write_csv(results: &[LoanCashflow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    for result in results {
        let t = &result.cashflow;
        for i in 0..t.len() {
            writer.serialize(PeriodRow {
                loan_id: &result.loan_id,
                period: t.period[i],
                beg_bal: t.beg_bal[i],
                interest: t.interest[i],
                principal: t.principal[i],
                sched_bal: t.sched_bal[i],
                prepayment: t.prepay_amount_arr[i],
                end_bal: t.end_bal[i],
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
