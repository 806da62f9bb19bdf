mod estimate;
mod line_item;
mod phase;
mod sheet;

pub use estimate::{Estimate, EstimateRecord};
pub use line_item::{LineItem, PhaseHours};
pub use phase::Phase;
pub use sheet::SheetSummary;
