//! Cost derivation for estimate line items.
//!
//! Every labour phase is billed at one flat hourly rate; a line item's total
//! is its materials plus its labour.

pub mod common;
pub mod costing;

pub use common::{parse_number, round_half_up};
pub use costing::{CostConfig, CostConfigError, DEFAULT_HOURLY_RATE, running_total};
