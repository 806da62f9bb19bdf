//! Moving estimates in and out of CSV.

pub mod layout;
pub mod loader;

pub use layout::{SHEET_HEADERS, SheetLayout, SheetLayoutError};
pub use loader::{LineItemLoader, LineItemLoaderError, LineItemRecord};
