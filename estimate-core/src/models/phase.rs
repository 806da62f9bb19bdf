use serde::{Deserialize, Serialize};

/// Labour category billed on a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Engineering,
    Production,
    Finish,
    Installation,
}

impl Phase {
    /// Every phase, in the order they appear on an estimate sheet.
    pub const ALL: [Phase; 4] = [
        Phase::Engineering,
        Phase::Production,
        Phase::Finish,
        Phase::Installation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Engineering => "Engineering",
            Self::Production => "Production",
            Self::Finish => "Finish",
            Self::Installation => "Installation",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn all_follows_sheet_column_order() {
        let labels: Vec<String> = Phase::ALL.iter().map(ToString::to_string).collect();

        assert_eq!(labels, vec!["Engineering", "Production", "Finish", "Installation"]);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Finish).unwrap(), "\"finish\"");
        assert_eq!(
            serde_json::from_str::<Phase>("\"installation\"").unwrap(),
            Phase::Installation
        );
    }
}
