//! Store wiring and the work behind each `estimator` subcommand.
//!
//! Handlers write their report to `out` so they can be driven from tests.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use estimate_core::calculations::round_half_up;
use estimate_core::db::{MemoryStoreFactory, StoreConfig, StoreRegistry};
use estimate_core::{CostConfig, EstimateDialog, FormField, Phase};
use estimate_data::{LineItemLoader, LineItemRecord, SheetLayout};
use estimate_db_sqlite::SqliteStoreFactory;
use tracing::{debug, info};

/// Registry with every backend this binary ships.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(MemoryStoreFactory));
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

/// Open the configured store and a dialog over it.
pub async fn open_dialog(
    store: &StoreConfig,
    cost: CostConfig,
) -> Result<EstimateDialog> {
    debug!(backend = %store.backend, "opening sheet store");
    let registry = build_registry();
    let sheets = registry
        .create(store)
        .await
        .with_context(|| format!("Failed to open '{}' store", store.backend))?;
    EstimateDialog::open(sheets, cost)
        .await
        .context("Failed to list sheets")
}

pub fn list_sheets(
    dialog: &EstimateDialog,
    out: &mut impl Write,
) -> Result<()> {
    if dialog.sheets().is_empty() {
        writeln!(out, "No estimate sheets.")?;
        return Ok(());
    }
    for sheet in dialog.sheets() {
        let marker = if sheet.is_active { "*" } else { " " };
        writeln!(out, "{marker} {:>3}  {}", sheet.index, sheet.name)?;
    }
    Ok(())
}

/// Enter `items` through the dialog's form and submit them as a new sheet.
pub async fn new_estimate(
    dialog: &mut EstimateDialog,
    customer: &str,
    estimate_number: &str,
    items: &[LineItemRecord],
    date: NaiveDate,
    out: &mut impl Write,
) -> Result<()> {
    let form = dialog.form_mut();
    form.set_field(FormField::Customer, customer);
    form.set_field(FormField::EstimateNumber, estimate_number);
    form.validate()?;
    LineItemLoader::apply(form, items);
    let total = form.running_total();

    dialog.submit(date).await?;
    info!(items = items.len(), %total, "new estimate stored");
    writeln!(
        out,
        "Created {}-{} with {} line items, total {}",
        customer.trim(),
        estimate_number.trim(),
        items.len(),
        total
    )?;
    Ok(())
}

/// Print the active estimate with per-item and running totals. Money is
/// shown to the cent.
pub async fn show_active(
    dialog: &mut EstimateDialog,
    out: &mut impl Write,
) -> Result<()> {
    dialog.load_active().await.context("Failed to read active sheet")?;
    let Some(sheet) = dialog.active_sheet() else {
        writeln!(out, "No active estimate.")?;
        return Ok(());
    };
    let form = dialog.form();

    writeln!(out, "Sheet:    {}", sheet.name)?;
    writeln!(out, "Customer: {}", form.customer())?;
    writeln!(out, "Estimate: {}", form.estimate_number())?;
    for (index, item) in form.line_items().iter().enumerate() {
        writeln!(out, "{index:>3}  {}", item.description)?;
        writeln!(out, "       Materials        {}", round_half_up(item.materials))?;
        for phase in Phase::ALL {
            writeln!(
                out,
                "       {:<16} {} h  {}",
                phase.label(),
                item.hours(phase),
                round_half_up(item.cost(phase))
            )?;
        }
        writeln!(out, "       Labour           {}", round_half_up(item.labour_cost()))?;
        writeln!(out, "       Total            {}", round_half_up(item.total_cost))?;
    }
    writeln!(out, "Running total: {}", round_half_up(form.running_total()))?;
    Ok(())
}

pub async fn activate(
    dialog: &mut EstimateDialog,
    name: &str,
    out: &mut impl Write,
) -> Result<()> {
    dialog
        .activate(name)
        .await
        .with_context(|| format!("Failed to activate '{name}'"))?;
    writeln!(out, "Active sheet: {name}")?;
    Ok(())
}

pub async fn delete(
    dialog: &mut EstimateDialog,
    index: usize,
    out: &mut impl Write,
) -> Result<()> {
    let name = dialog
        .sheets()
        .get(index)
        .map(|sheet| sheet.name.clone())
        .unwrap_or_else(|| format!("#{index}"));
    dialog
        .delete_sheet(index)
        .await
        .with_context(|| format!("Failed to delete sheet {index}"))?;
    writeln!(out, "Deleted {name}")?;
    Ok(())
}

/// Write the active sheet in sheet layout, carrying the date it was
/// submitted on.
pub async fn export_active(
    dialog: &EstimateDialog,
    writer: impl Write,
) -> Result<()> {
    let Some(record) = dialog
        .store()
        .active_record()
        .await
        .context("Failed to read active sheet")?
    else {
        bail!("no active estimate to export");
    };
    SheetLayout::write_csv(&record, writer)?;
    Ok(())
}
