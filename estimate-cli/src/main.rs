use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use estimate_cli::config::{AppConfig, Overrides};
use estimate_cli::{app, logging};
use estimate_data::LineItemLoader;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Build and manage job cost estimates.
///
/// Each estimate is stored as a named sheet (`<customer>-<estimate number>`)
/// in the configured workbook store.
#[derive(Debug, Parser)]
#[command(name = "estimator", version)]
struct Cli {
    /// Configuration file. Defaults to `estimator.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store backend (`sqlite` or `memory`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Store connection string.
    /// For SQLite this is a file path (e.g. `estimates.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or EnvFilter directive. `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Hourly labour rate.
    #[arg(long, global = true)]
    rate: Option<Decimal>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every sheet; the active one is marked with `*`.
    List,

    /// Create a new estimate sheet and make it active.
    New {
        #[arg(long)]
        customer: String,

        #[arg(long)]
        estimate_number: String,

        /// CSV of line items (description, materials, *_hours columns).
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// Show the active estimate with per-item and running totals.
    Show,

    /// Make the named sheet active.
    Activate { name: String },

    /// Delete the sheet at a zero-based index.
    Delete { index: usize },

    /// Write the active estimate as CSV in sheet layout.
    Export { file: PathBuf },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?.apply(Overrides {
        backend: cli.backend,
        db: cli.db,
        log_level: cli.log_level,
        hourly_rate: cli.rate,
    })?;

    logging::init_logging(&config.log_level);
    if let Some(path) = &config.log_file {
        logging::enable_file_logging(path)?;
    }
    debug!(?config, "configuration resolved");

    let mut dialog = app::open_dialog(&config.store, config.cost_config()?).await?;
    let mut stdout = io::stdout().lock();
    let today = Local::now().date_naive();

    match cli.command {
        Command::List => app::list_sheets(&dialog, &mut stdout)?,
        Command::New {
            customer,
            estimate_number,
            items,
        } => {
            let records = match items {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("Failed to open: {}", path.display()))?;
                    LineItemLoader::parse(file)
                        .with_context(|| format!("Failed to parse CSV: {}", path.display()))?
                }
                None => Vec::new(),
            };
            app::new_estimate(
                &mut dialog,
                &customer,
                &estimate_number,
                &records,
                today,
                &mut stdout,
            )
            .await?
        }
        Command::Show => app::show_active(&mut dialog, &mut stdout).await?,
        Command::Activate { name } => app::activate(&mut dialog, &name, &mut stdout).await?,
        Command::Delete { index } => app::delete(&mut dialog, index, &mut stdout).await?,
        Command::Export { file } => {
            let writer = File::create(&file)
                .with_context(|| format!("Failed to create: {}", file.display()))?;
            app::export_active(&dialog, writer).await?;
            writeln!(stdout, "Exported active estimate to {}", file.display())?;
        }
    }

    Ok(())
}
