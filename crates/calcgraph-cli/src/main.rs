//! calcgraph CLI - evaluate calculations from a snapshot file

use anyhow::{Context, Result};
use calcgraph::prelude::*;
use calcgraph::{CatalogTranslator, IdentityTranslator};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "calc")]
#[command(author, version, about = "Evaluate and inspect calcgraph snapshots")]
struct Cli {
    /// Snapshot file (JSON) holding constants, calculations, materials and reports
    #[arg(short, long, global = true, default_value = "snapshot.json")]
    snapshot: PathBuf,

    /// Calculator options file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Message catalog (JSON object) used to translate reasons
    #[arg(short, long, global = true)]
    locale: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the latest revision of a calculation
    Eval {
        /// Calculation unique id
        unique_id: String,

        /// Company id
        #[arg(long)]
        company: String,

        /// Financial period: YYYY or YYYY-MM-DD..YYYY-MM-DD
        #[arg(long)]
        period: String,

        /// Company location used to pick constant samples
        #[arg(long, default_value = "default")]
        location: String,
    },

    /// Evaluate every row of a report
    Report {
        /// Report name
        name: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        period: String,

        #[arg(long, default_value = "default")]
        location: String,
    },

    /// Check whether a constant or calculation could be deleted
    CheckDelete {
        /// Entity kind
        #[arg(value_enum)]
        kind: KindArg,

        /// Unique id
        unique_id: String,
    },

    /// List all revisions of a calculation
    History {
        /// Calculation unique id
        unique_id: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum KindArg {
    Constant,
    Calculation,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Constant => EntityKind::Constant,
            KindArg::Calculation => EntityKind::Calculation,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let snapshot = Snapshot::load(&cli.snapshot)
        .with_context(|| format!("Failed to load snapshot '{}'", cli.snapshot.display()))?;
    let (store, materials) = snapshot
        .into_stores()
        .context("Snapshot contains invalid data")?;

    let options = match &cli.config {
        Some(path) => CalculatorOptions::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => CalculatorOptions::default(),
    };
    let catalog = match &cli.locale {
        Some(path) => Some(load_catalog(path)?),
        None => None,
    };
    let translator: &dyn Translator = match &catalog {
        Some(catalog) => catalog,
        None => &IdentityTranslator,
    };

    match cli.command {
        Commands::Eval {
            unique_id,
            company,
            period,
            location,
        } => {
            let company = company_context(company, &period, location)?;
            let calculator = Calculator::new(&store, &materials)
                .with_options(options)
                .with_translator(translator);
            let result = calculator
                .evaluate_latest(&company, &unique_id)
                .with_context(|| format!("Failed to evaluate '{}'", unique_id))?;
            print_json(&result)
        }
        Commands::Report {
            name,
            company,
            period,
            location,
        } => {
            let company = company_context(company, &period, location)?;
            let calculator = Calculator::new(&store, &materials)
                .with_options(options)
                .with_translator(translator);
            let result = calculator
                .evaluate_report(&company, &name)
                .with_context(|| format!("Failed to evaluate report '{}'", name))?;
            eprintln!(
                "Evaluated {} rows ({} errors, {} with reasons, {} missing)",
                result.stats.evaluated,
                result.stats.errors,
                result.stats.with_reasons,
                result.stats.missing
            );
            print_json(&result)
        }
        Commands::CheckDelete { kind, unique_id } => {
            let kind = EntityKind::from(kind);
            let manager = VersionManager::new(&store);
            let referrers = manager
                .referrers(kind, &unique_id)
                .with_context(|| format!("Failed to look up references to '{}'", unique_id))?;
            print_json(&DeleteCheck {
                kind,
                unique_id,
                deletable: referrers.is_empty(),
                referrers,
            })
        }
        Commands::History { unique_id } => {
            let history = VersionManager::new(&store)
                .history(&unique_id)
                .with_context(|| format!("Failed to read history of '{}'", unique_id))?;
            let rows: Vec<HistoryRow> = history
                .iter()
                .map(|calc| HistoryRow {
                    id: calc.id,
                    version: calc.version,
                    latest: calc.latest,
                    unit: &calc.unit,
                    expression: calc.display_expression(),
                })
                .collect();
            print_json(&rows)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteCheck {
    kind: EntityKind,
    unique_id: String,
    deletable: bool,
    referrers: Vec<calcgraph::Referrer>,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    id: RecordId,
    version: u32,
    latest: bool,
    unit: &'a str,
    expression: String,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn company_context(company: String, period: &str, location: String) -> Result<CompanyContext> {
    let period: FinancialPeriod = period
        .parse()
        .with_context(|| format!("Invalid period '{}'", period))?;
    Ok(CompanyContext::new(company, period, location))
}

fn load_catalog(path: &Path) -> Result<CatalogTranslator> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read locale '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid locale '{}'", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to write output")?;
    writeln!(out)?;
    Ok(())
}
