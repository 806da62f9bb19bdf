//! Line-item pricing.
//!
//! # Formula
//!
//! | Value | Derivation |
//! |-------|------------|
//! | phase cost | phase hours × hourly rate |
//! | total cost | materials + (sum of phase hours) × hourly rate |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use estimate_core::{CostConfig, PhaseHours};
//!
//! let config = CostConfig::default();
//! let item = config.price(
//!     "Handrail",
//!     dec!(50),
//!     PhaseHours {
//!         engineering: dec!(2),
//!         production: dec!(1),
//!         ..Default::default()
//!     },
//! );
//!
//! assert_eq!(item.engineering_cost, dec!(200));
//! assert_eq!(item.total_cost, dec!(350));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{LineItem, Phase, PhaseHours};

/// Rate charged per labour hour when nothing else is configured.
pub const DEFAULT_HOURLY_RATE: Decimal = Decimal::ONE_HUNDRED;

/// Errors raised by [`CostConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CostConfigError {
    /// The hourly rate must be strictly positive.
    #[error("hourly rate must be positive, got {0}")]
    InvalidHourlyRate(Decimal),
}

/// Pricing parameters applied uniformly to every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostConfig {
    /// Amount charged per labour hour, identical for all four phases.
    pub hourly_rate: Decimal,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            hourly_rate: DEFAULT_HOURLY_RATE,
        }
    }
}

impl CostConfig {
    pub fn new(hourly_rate: Decimal) -> Result<Self, CostConfigError> {
        let config = Self { hourly_rate };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CostConfigError> {
        if self.hourly_rate <= Decimal::ZERO {
            return Err(CostConfigError::InvalidHourlyRate(self.hourly_rate));
        }
        Ok(())
    }

    /// Cost of `hours` of labour in any phase.
    pub fn phase_cost(
        &self,
        hours: Decimal,
    ) -> Decimal {
        hours * self.hourly_rate
    }

    /// Builds a fully derived [`LineItem`].
    ///
    /// Negative inputs are priced as given.
    pub fn price(
        &self,
        description: impl Into<String>,
        materials: Decimal,
        hours: PhaseHours,
    ) -> LineItem {
        let description = description.into();
        let negative_hours = Phase::ALL.iter().any(|p| hours.get(*p).is_sign_negative());
        if materials.is_sign_negative() || negative_hours {
            warn!(%description, "line item priced with negative materials or hours");
        }

        LineItem {
            description,
            materials,
            engineering_hours: hours.engineering,
            production_hours: hours.production,
            finish_hours: hours.finish,
            installation_hours: hours.installation,
            engineering_cost: self.phase_cost(hours.engineering),
            production_cost: self.phase_cost(hours.production),
            finish_cost: self.phase_cost(hours.finish),
            installation_cost: self.phase_cost(hours.installation),
            total_cost: materials + self.phase_cost(hours.total()),
        }
    }
}

/// Sum of `total_cost` over `items`; zero for an empty slice.
pub fn running_total(items: &[LineItem]) -> Decimal {
    items.iter().map(|item| item.total_cost).sum()
}
