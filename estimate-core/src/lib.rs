pub mod calculations;
pub mod db;
pub mod dialog;
pub mod form;
pub mod models;

pub use calculations::{CostConfig, CostConfigError, DEFAULT_HOURLY_RATE};
pub use db::repository::{SheetStore, StoreError};
pub use dialog::EstimateDialog;
pub use form::{EditState, EstimateForm, FormError, FormField};
pub use models::*;
