use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::{FormError, REQUIRED_FIELDS_MESSAGE};
use crate::calculations::{CostConfig, parse_number, running_total};
use crate::db::SheetStore;
use crate::models::{Estimate, LineItem, Phase, PhaseHours, SheetSummary};

/// Editable text fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Customer,
    EstimateNumber,
    Description,
    Materials,
    Hours(Phase),
}

/// Whether the next commit appends a line item or replaces one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(usize),
}

fn slot(phase: Phase) -> usize {
    match phase {
        Phase::Engineering => 0,
        Phase::Production => 1,
        Phase::Finish => 2,
        Phase::Installation => 3,
    }
}

/// Text the user has typed for the line item under construction, plus the
/// read-only phase costs derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LineItemDraft {
    description: String,
    materials: String,
    hours: [String; 4],
    costs: [Option<Decimal>; 4],
}

/// Form state for one estimate.
///
/// Field values are kept as typed and only coerced to numbers when costs are
/// derived. The running total is cached and refreshed on every list change.
#[derive(Debug, Clone)]
pub struct EstimateForm {
    config: CostConfig,
    customer: String,
    estimate_number: String,
    draft: LineItemDraft,
    line_items: Vec<LineItem>,
    edit: EditState,
    running_total: Decimal,
}

impl Default for EstimateForm {
    fn default() -> Self {
        Self::new(CostConfig::default())
    }
}

impl EstimateForm {
    pub fn new(config: CostConfig) -> Self {
        Self {
            config,
            customer: String::new(),
            estimate_number: String::new(),
            draft: LineItemDraft::default(),
            line_items: Vec::new(),
            edit: EditState::Idle,
            running_total: Decimal::ZERO,
        }
    }

    pub fn config(&self) -> &CostConfig {
        &self.config
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn estimate_number(&self) -> &str {
        &self.estimate_number
    }

    /// Current text of any field.
    pub fn field(
        &self,
        field: FormField,
    ) -> &str {
        match field {
            FormField::Customer => &self.customer,
            FormField::EstimateNumber => &self.estimate_number,
            FormField::Description => &self.draft.description,
            FormField::Materials => &self.draft.materials,
            FormField::Hours(phase) => &self.draft.hours[slot(phase)],
        }
    }

    /// Derived cost shown next to a phase's hours; `None` until hours are
    /// entered for that phase.
    pub fn draft_cost(
        &self,
        phase: Phase,
    ) -> Option<Decimal> {
        self.draft.costs[slot(phase)]
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn edit_state(&self) -> EditState {
        self.edit
    }

    /// Sum of `total_cost` across the current line items.
    pub fn running_total(&self) -> Decimal {
        self.running_total
    }

    /// Store a field value as typed. Hours fields also refresh their
    /// derived cost.
    pub fn set_field(
        &mut self,
        field: FormField,
        value: impl Into<String>,
    ) {
        let value = value.into();
        match field {
            FormField::Customer => self.customer = value,
            FormField::EstimateNumber => self.estimate_number = value,
            FormField::Description => self.draft.description = value,
            FormField::Materials => self.draft.materials = value,
            FormField::Hours(phase) => self.on_hours_change(phase, value),
        }
    }

    /// Store the hours text for `phase` and recompute its cost. Text that
    /// is not a number costs as zero hours.
    pub fn on_hours_change(
        &mut self,
        phase: Phase,
        value: impl Into<String>,
    ) {
        let value = value.into();
        let cost = self.config.phase_cost(parse_number(&value));
        self.draft.hours[slot(phase)] = value;
        self.draft.costs[slot(phase)] = Some(cost);
    }

    /// Price the draft and append it, or replace the item being edited in
    /// place. Clears the draft and returns to [`EditState::Idle`].
    ///
    /// Returns the index the item now occupies.
    pub fn commit_line_item(&mut self) -> usize {
        let mut hours = PhaseHours::default();
        for phase in Phase::ALL {
            hours.set(phase, parse_number(&self.draft.hours[slot(phase)]));
        }
        let materials = parse_number(&self.draft.materials);
        let description = std::mem::take(&mut self.draft.description);
        let item = self.config.price(description, materials, hours);

        let index = match self.edit {
            EditState::Editing(index) if index < self.line_items.len() => {
                self.line_items[index] = item;
                debug!(index, "line item updated");
                index
            }
            _ => {
                self.line_items.push(item);
                debug!(index = self.line_items.len() - 1, "line item added");
                self.line_items.len() - 1
            }
        };

        self.draft = LineItemDraft::default();
        self.edit = EditState::Idle;
        self.refresh_total();
        index
    }

    /// Load the item at `index` into the draft and switch to editing it.
    pub fn begin_edit(
        &mut self,
        index: usize,
    ) -> Result<(), FormError> {
        let item = self.line_items.get(index).ok_or(FormError::NoSuchLineItem {
            index,
            len: self.line_items.len(),
        })?;

        let mut draft = LineItemDraft {
            description: item.description.clone(),
            materials: item.materials.to_string(),
            ..Default::default()
        };
        let hours = item.phase_hours();
        for phase in Phase::ALL {
            draft.hours[slot(phase)] = hours.get(phase).to_string();
            draft.costs[slot(phase)] = Some(item.cost(phase));
        }

        self.draft = draft;
        self.edit = EditState::Editing(index);
        debug!(index, "editing line item");
        Ok(())
    }

    /// Abandon the draft without touching the list.
    pub fn cancel_edit(&mut self) {
        self.draft = LineItemDraft::default();
        self.edit = EditState::Idle;
    }

    /// Checks the header fields required for submission.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.customer.trim().is_empty() || self.estimate_number.trim().is_empty() {
            return Err(FormError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        Ok(())
    }

    /// Snapshot of the estimate as it would be submitted.
    pub fn to_estimate(&self) -> Result<Estimate, FormError> {
        self.validate()?;
        Ok(Estimate {
            customer: self.customer.trim().to_string(),
            estimate_number: self.estimate_number.trim().to_string(),
            line_items: self.line_items.clone(),
        })
    }

    /// Hand the estimate to `store` as a new sheet dated `date`.
    ///
    /// On success the form is reset and the store's updated listing is
    /// returned. On any failure the form is left exactly as it was.
    pub async fn submit(
        &mut self,
        store: &dyn SheetStore,
        date: NaiveDate,
    ) -> Result<Vec<SheetSummary>, FormError> {
        let estimate = self.to_estimate()?;
        let title = estimate.sheet_title();
        let record = estimate.into_record(date);

        let sheets = store.create(&title, &record).await.map_err(|e| {
            warn!(sheet = %title, error = %e, "estimate submission failed");
            FormError::from(e)
        })?;

        info!(sheet = %title, items = record.line_items.len(), "estimate submitted");
        self.customer.clear();
        self.estimate_number.clear();
        self.cancel_edit();
        self.set_line_items(Vec::new());
        Ok(sheets)
    }

    /// Synchronise with the store's active sheet. `None` resets the whole
    /// form; either way editing stops.
    pub fn load_active_estimate(
        &mut self,
        estimate: Option<Estimate>,
    ) {
        self.cancel_edit();
        match estimate {
            Some(estimate) => {
                debug!(customer = %estimate.customer, "loading active estimate");
                self.customer = estimate.customer;
                self.estimate_number = estimate.estimate_number;
                self.set_line_items(estimate.line_items);
            }
            None => {
                debug!("no active estimate; resetting form");
                self.customer.clear();
                self.estimate_number.clear();
                self.set_line_items(Vec::new());
            }
        }
    }

    fn set_line_items(
        &mut self,
        items: Vec<LineItem>,
    ) {
        self.line_items = items;
        self.refresh_total();
    }

    fn refresh_total(&mut self) {
        self.running_total = running_total(&self.line_items);
    }
}
