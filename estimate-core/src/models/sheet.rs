use serde::{Deserialize, Serialize};

/// Entry in a sheet store's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub name: String,
    /// Zero-based position within the store.
    pub index: usize,
    pub is_active: bool,
}
