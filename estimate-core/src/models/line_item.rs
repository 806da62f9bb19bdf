use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Phase;

/// Labour hours for each [`Phase`] of a line item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseHours {
    pub engineering: Decimal,
    pub production: Decimal,
    pub finish: Decimal,
    pub installation: Decimal,
}

impl PhaseHours {
    pub fn get(
        &self,
        phase: Phase,
    ) -> Decimal {
        match phase {
            Phase::Engineering => self.engineering,
            Phase::Production => self.production,
            Phase::Finish => self.finish,
            Phase::Installation => self.installation,
        }
    }

    pub fn set(
        &mut self,
        phase: Phase,
        hours: Decimal,
    ) {
        match phase {
            Phase::Engineering => self.engineering = hours,
            Phase::Production => self.production = hours,
            Phase::Finish => self.finish = hours,
            Phase::Installation => self.installation = hours,
        }
    }

    /// Sum of all four phases.
    pub fn total(&self) -> Decimal {
        Phase::ALL.iter().map(|p| self.get(*p)).sum()
    }
}

/// One billable row of an estimate.
///
/// The `*_cost` fields and `total_cost` are derived from the hours and the
/// hourly rate in effect when the item was priced; build items through
/// [`CostConfig::price`](crate::CostConfig::price) so they stay consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub materials: Decimal,

    pub engineering_hours: Decimal,
    pub production_hours: Decimal,
    pub finish_hours: Decimal,
    pub installation_hours: Decimal,

    // Derived
    pub engineering_cost: Decimal,
    pub production_cost: Decimal,
    pub finish_cost: Decimal,
    pub installation_cost: Decimal,
    pub total_cost: Decimal,
}

impl LineItem {
    pub fn hours(
        &self,
        phase: Phase,
    ) -> Decimal {
        match phase {
            Phase::Engineering => self.engineering_hours,
            Phase::Production => self.production_hours,
            Phase::Finish => self.finish_hours,
            Phase::Installation => self.installation_hours,
        }
    }

    pub fn cost(
        &self,
        phase: Phase,
    ) -> Decimal {
        match phase {
            Phase::Engineering => self.engineering_cost,
            Phase::Production => self.production_cost,
            Phase::Finish => self.finish_cost,
            Phase::Installation => self.installation_cost,
        }
    }

    pub fn phase_hours(&self) -> PhaseHours {
        PhaseHours {
            engineering: self.engineering_hours,
            production: self.production_hours,
            finish: self.finish_hours,
            installation: self.installation_hours,
        }
    }

    /// Labour portion of the total (everything except materials).
    pub fn labour_cost(&self) -> Decimal {
        Phase::ALL.iter().map(|p| self.cost(*p)).sum()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn phase_hours_get_and_set_address_the_same_slot() {
        let mut hours = PhaseHours::default();
        for (i, phase) in Phase::ALL.into_iter().enumerate() {
            hours.set(phase, Decimal::from(i + 1));
        }

        assert_eq!(hours.get(Phase::Engineering), dec!(1));
        assert_eq!(hours.get(Phase::Production), dec!(2));
        assert_eq!(hours.get(Phase::Finish), dec!(3));
        assert_eq!(hours.get(Phase::Installation), dec!(4));
        assert_eq!(hours.total(), dec!(10));
    }

    #[test]
    fn line_item_serializes_with_camel_case_keys() {
        let item = LineItem {
            description: "Stair rail".to_string(),
            materials: dec!(50),
            engineering_hours: dec!(2),
            production_hours: dec!(1),
            finish_hours: dec!(0),
            installation_hours: dec!(0),
            engineering_cost: dec!(200),
            production_cost: dec!(100),
            finish_cost: dec!(0),
            installation_cost: dec!(0),
            total_cost: dec!(350),
        };

        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["description"], "Stair rail");
        assert!(json.get("engineeringHours").is_some());
        assert!(json.get("installationCost").is_some());
        assert!(json.get("totalCost").is_some());
        assert_eq!(item.labour_cost(), dec!(300));
        assert_eq!(item.phase_hours().total(), dec!(3));
    }
}
