//! Draft state for building an estimate one line item at a time.

mod estimate_form;

use thiserror::Error;

use crate::db::StoreError;

pub use estimate_form::{EditState, EstimateForm, FormField};

/// Message shown when a submission lacks its header fields.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Customer and Estimate Number are required";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    /// Required header fields are blank. Nothing was changed.
    #[error("{0}")]
    Validation(String),

    /// `begin_edit` was given an index past the end of the list.
    #[error("no line item at index {index} (the estimate has {len})")]
    NoSuchLineItem { index: usize, len: usize },

    /// The sheet store rejected or failed the submission. Drafts are kept so
    /// the user can retry.
    #[error("sheet store failed: {0}")]
    Collaborator(#[from] StoreError),
}
