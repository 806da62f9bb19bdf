use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use estimate_core::{CostConfig, DEFAULT_HOURLY_RATE, EstimateForm, SheetStore};
use estimate_data::LineItemLoader;
use estimate_db_sqlite::SqliteSheetStore;
use rust_decimal::Decimal;

/// Import line items from a CSV file and store them as a new estimate sheet.
///
/// The CSV file should have the following columns:
/// - description: Free text
/// - materials: Materials cost (optional)
/// - engineering_hours, production_hours, finish_hours, installation_hours:
///   Hours per phase (optional, blank counts as zero)
#[derive(Parser, Debug)]
#[command(name = "estimate-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing line items
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL (e.g., sqlite:estimates.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:estimates.db?mode=rwc")]
    database: String,

    /// Customer name for the new sheet
    #[arg(short, long)]
    customer: String,

    /// Estimate number for the new sheet
    #[arg(short, long)]
    estimate_number: String,

    /// Hourly labour rate
    #[arg(short, long, default_value_t = DEFAULT_HOURLY_RATE)]
    rate: Decimal,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = CostConfig::new(args.rate).context("Invalid hourly rate")?;

    let store = SqliteSheetStore::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        store
            .run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    println!("Loading line items from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = LineItemLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} line items from CSV", records.len());

    let mut form = EstimateForm::new(config);
    let today = Local::now().date_naive();
    let sheets = LineItemLoader::load(
        &store,
        &mut form,
        &args.customer,
        &args.estimate_number,
        today,
        &records,
    )
    .await
    .context("Failed to store estimate")?;

    let total = store
        .active_estimate()
        .await
        .context("Failed to read back the new sheet")?
        .map(|estimate| estimate.total())
        .unwrap_or_default();

    println!(
        "Stored {} line items on sheet {}-{} (total {}). The workbook now has {} sheets.",
        records.len(),
        args.customer.trim(),
        args.estimate_number.trim(),
        total,
        sheets.len()
    );

    Ok(())
}
