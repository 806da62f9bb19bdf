//! Session that ties an [`EstimateForm`] to a [`SheetStore`].
//!
//! The dialog keeps the last sheet listing the store reported and keeps the
//! form synchronised with whichever sheet is active. A failed store call
//! leaves both the listing and the form as they were.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::calculations::CostConfig;
use crate::db::{SheetStore, StoreError};
use crate::form::{EstimateForm, FormError};
use crate::models::SheetSummary;

pub struct EstimateDialog {
    store: Box<dyn SheetStore>,
    sheets: Vec<SheetSummary>,
    form: EstimateForm,
}

impl EstimateDialog {
    /// Open a dialog over `store` and fetch its current listing.
    pub async fn open(
        store: Box<dyn SheetStore>,
        config: CostConfig,
    ) -> Result<Self, StoreError> {
        let sheets = store.list().await?;
        debug!(sheets = sheets.len(), "estimate dialog opened");
        Ok(Self {
            store,
            sheets,
            form: EstimateForm::new(config),
        })
    }

    pub fn sheets(&self) -> &[SheetSummary] {
        &self.sheets
    }

    pub fn active_sheet(&self) -> Option<&SheetSummary> {
        self.sheets.iter().find(|sheet| sheet.is_active)
    }

    pub fn form(&self) -> &EstimateForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EstimateForm {
        &mut self.form
    }

    pub fn store(&self) -> &dyn SheetStore {
        self.store.as_ref()
    }

    pub async fn refresh(&mut self) -> Result<&[SheetSummary], StoreError> {
        self.sheets = self.store.list().await?;
        Ok(&self.sheets)
    }

    pub async fn delete_sheet(
        &mut self,
        index: usize,
    ) -> Result<&[SheetSummary], StoreError> {
        self.sheets = self.store.delete(index).await.inspect_err(|e| {
            warn!(index, error = %e, "sheet delete failed");
        })?;
        Ok(&self.sheets)
    }

    /// Make `name` the active sheet and load its estimate into the form.
    pub async fn activate(
        &mut self,
        name: &str,
    ) -> Result<&[SheetSummary], StoreError> {
        let sheets = self.store.set_active(name).await?;
        let estimate = self.store.active_estimate().await?;

        self.sheets = sheets;
        self.form.load_active_estimate(estimate);
        Ok(&self.sheets)
    }

    /// Reload the form from whatever sheet the store considers active.
    pub async fn load_active(&mut self) -> Result<(), StoreError> {
        let estimate = self.store.active_estimate().await?;
        self.form.load_active_estimate(estimate);
        Ok(())
    }

    /// Submit the form as a new sheet dated `date`.
    pub async fn submit(
        &mut self,
        date: NaiveDate,
    ) -> Result<&[SheetSummary], FormError> {
        self.sheets = self.form.submit(self.store.as_ref(), date).await?;
        Ok(&self.sheets)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db::MemorySheetStore;
    use crate::form::{EditState, FormField};
    use crate::models::Phase;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()
    }

    async fn dialog() -> EstimateDialog {
        EstimateDialog::open(Box::new(MemorySheetStore::new()), CostConfig::default())
            .await
            .unwrap()
    }

    async fn submit(
        dialog: &mut EstimateDialog,
        customer: &str,
        materials: &str,
    ) {
        let form = dialog.form_mut();
        form.set_field(FormField::Customer, customer);
        form.set_field(FormField::EstimateNumber, "1");
        form.set_field(FormField::Materials, materials);
        form.on_hours_change(Phase::Engineering, "1");
        form.commit_line_item();
        dialog.submit(date()).await.unwrap();
    }

    #[tokio::test]
    async fn open_lists_existing_sheets() {
        let dialog = dialog().await;

        assert!(dialog.sheets().is_empty());
        assert_eq!(dialog.active_sheet(), None);
    }

    #[tokio::test]
    async fn submit_updates_listing() {
        let mut dialog = dialog().await;
        submit(&mut dialog, "Acme", "10").await;
        submit(&mut dialog, "Bolt", "20").await;

        let names: Vec<_> = dialog.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Acme-1", "Bolt-1"]);
        assert_eq!(dialog.active_sheet().unwrap().name, "Bolt-1");
        assert!(dialog.form().line_items().is_empty());
    }

    #[tokio::test]
    async fn activate_loads_sheet_into_form() {
        let mut dialog = dialog().await;
        submit(&mut dialog, "Acme", "10").await;
        submit(&mut dialog, "Bolt", "20").await;

        dialog.activate("Acme-1").await.unwrap();

        assert_eq!(dialog.active_sheet().unwrap().name, "Acme-1");
        assert_eq!(dialog.form().customer(), "Acme");
        assert_eq!(dialog.form().running_total(), dec!(110));
        assert_eq!(dialog.form().edit_state(), EditState::Idle);
    }

    #[tokio::test]
    async fn activate_unknown_sheet_keeps_state() {
        let mut dialog = dialog().await;
        submit(&mut dialog, "Acme", "10").await;
        dialog.form_mut().set_field(FormField::Customer, "draft");

        let result = dialog.activate("missing").await;

        assert_eq!(result.err(), Some(StoreError::NotFound("missing".to_string())));
        assert_eq!(dialog.form().customer(), "draft");
        assert_eq!(dialog.sheets().len(), 1);
    }

    #[tokio::test]
    async fn delete_then_load_active_follows_store() {
        let mut dialog = dialog().await;
        submit(&mut dialog, "Acme", "10").await;
        submit(&mut dialog, "Bolt", "20").await;

        dialog.delete_sheet(1).await.unwrap();
        dialog.load_active().await.unwrap();

        assert_eq!(dialog.sheets().len(), 1);
        assert_eq!(dialog.form().customer(), "Acme");

        dialog.delete_sheet(0).await.unwrap();
        dialog.load_active().await.unwrap();

        assert!(dialog.sheets().is_empty());
        assert_eq!(dialog.form().customer(), "");
        assert!(dialog.form().line_items().is_empty());
    }

    #[tokio::test]
    async fn refresh_sees_writes_made_through_the_store() {
        let mut dialog = dialog().await;
        submit(&mut dialog, "Acme", "10").await;
        dialog.store().delete(0).await.unwrap();

        assert_eq!(dialog.sheets().len(), 1);
        assert!(dialog.refresh().await.unwrap().is_empty());
    }
}
