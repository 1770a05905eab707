//! Enumeration types for mice, behaviors, and tracked chart metrics.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Sex
// ---------------------------------------------------------------------------

/// The sex of a mouse. Determines mating compatibility in the engine and the
/// population chart column the mouse is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Sex {
    /// Can mate with any other sex.
    Hermaphrodite,
    /// Male mouse.
    Male,
    /// Female mouse.
    Female,
}

impl Sex {
    /// Every sex, in population chart column order.
    pub const ALL: [Self; 3] = [Self::Hermaphrodite, Self::Male, Self::Female];

    /// Human-readable label, also used as the population chart column header.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hermaphrodite => "Hermaphrodite",
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl core::fmt::Display for Sex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// One of the three mouse behaviors a player can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Behavior {
    /// Choosing which mouse to fight.
    PickFight,
    /// Choosing which mouse to ask to mate.
    ChooseMate,
    /// Answering a mating request.
    MateAnswer,
}

impl Behavior {
    /// Every behavior, in the order the owner charts are laid out.
    pub const ALL: [Self; 3] = [Self::PickFight, Self::ChooseMate, Self::MateAnswer];
}

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// A tracked time series. Each metric backs exactly one chart table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Metric {
    /// Live mice per sex.
    Population,
    /// Live mice per owner of the pick-fight behavior.
    PickFight,
    /// Live mice per owner of the choose-mate behavior.
    ChooseMate,
    /// Live mice per owner of the mate-answer behavior.
    MateAnswer,
}

impl Metric {
    /// Every metric, in chart order.
    pub const ALL: [Self; 4] = [
        Self::Population,
        Self::PickFight,
        Self::ChooseMate,
        Self::MateAnswer,
    ];

    /// Chart title for this metric.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Population => "Population",
            Self::PickFight => "Pick Fight",
            Self::ChooseMate => "Choose Mate",
            Self::MateAnswer => "Mate Answer",
        }
    }

    /// The behavior whose owners this metric counts, or `None` for the
    /// population metric.
    pub const fn behavior(self) -> Option<Behavior> {
        match self {
            Self::Population => None,
            Self::PickFight => Some(Behavior::PickFight),
            Self::ChooseMate => Some(Behavior::ChooseMate),
            Self::MateAnswer => Some(Behavior::MateAnswer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_owner_metric_maps_to_a_distinct_behavior() {
        let behaviors: Vec<Behavior> = Metric::ALL.iter().filter_map(|m| m.behavior()).collect();
        assert_eq!(behaviors, Behavior::ALL.to_vec());
    }

    #[test]
    fn sex_serializes_with_label() {
        for sex in Sex::ALL {
            let json = serde_json::to_string(&sex).ok();
            assert_eq!(json, Some(format!("\"{}\"", sex.label())));
        }
    }
}
