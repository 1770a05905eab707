//! Entity payloads delivered by the simulation engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Behavior, Sex};
use crate::ids::{MouseId, PlayerId};

// ---------------------------------------------------------------------------
// Mouse
// ---------------------------------------------------------------------------

/// A mouse as reported by the engine when it enters the cage (initial
/// population or birth).
///
/// The size, aggressiveness and fertility values are the engine's starting
/// values and are only used for narrative text. Aggregate statistics depend
/// on `sex` and the three owner fields alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Mouse {
    /// Unique identifier.
    pub id: MouseId,
    /// Sex of the mouse.
    pub sex: Sex,
    /// Body size.
    pub size: u32,
    /// Aggressiveness at birth.
    pub start_aggressiveness: u32,
    /// Fertility at birth.
    pub start_fertility: u32,
    /// Player whose code picks fights for this mouse.
    pub pick_fight_owner: PlayerId,
    /// Player whose code chooses mates for this mouse.
    pub choose_mate_owner: PlayerId,
    /// Player whose code answers mating requests for this mouse.
    pub mate_answer_owner: PlayerId,
}

impl Mouse {
    /// Return the player that owns the given behavior for this mouse.
    pub const fn owner(&self, behavior: Behavior) -> PlayerId {
        match behavior {
            Behavior::PickFight => self.pick_fight_owner,
            Behavior::ChooseMate => self.choose_mate_owner,
            Behavior::MateAnswer => self.mate_answer_owner,
        }
    }

    /// Return the three owners in [`Behavior::ALL`] order.
    pub const fn owners(&self) -> [PlayerId; 3] {
        [
            self.pick_fight_owner,
            self.choose_mate_owner,
            self.mate_answer_owner,
        ]
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A player entry in the participant directory.
///
/// The directory is an ordered list of participants; its order becomes the
/// column order of every owner chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Player identifier referenced by mouse owner fields.
    pub id: PlayerId,
    /// Display label used for chart headers and narrative text.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Winners
// ---------------------------------------------------------------------------

/// Per-behavior winners reported when the game ends. `None` means no player
/// won that behavior (for example because the cage died out).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Winners {
    /// Winner of the pick-fight behavior.
    #[serde(default)]
    pub pick_fight: Option<PlayerId>,
    /// Winner of the choose-mate behavior.
    #[serde(default)]
    pub choose_mate: Option<PlayerId>,
    /// Winner of the mate-answer behavior.
    #[serde(default)]
    pub mate_answer: Option<PlayerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_lookup_follows_behavior() {
        let mouse = Mouse {
            id: MouseId(1),
            sex: Sex::Male,
            size: 40,
            start_aggressiveness: 3,
            start_fertility: 5,
            pick_fight_owner: PlayerId(1),
            choose_mate_owner: PlayerId(2),
            mate_answer_owner: PlayerId(3),
        };
        assert_eq!(mouse.owner(Behavior::PickFight), PlayerId(1));
        assert_eq!(mouse.owner(Behavior::ChooseMate), PlayerId(2));
        assert_eq!(mouse.owner(Behavior::MateAnswer), PlayerId(3));
        assert_eq!(mouse.owners(), [PlayerId(1), PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn winners_default_to_none_when_missing() {
        let winners: Option<Winners> = serde_json::from_str("{\"pick_fight\": 2}").ok();
        assert_eq!(
            winners,
            Some(Winners {
                pick_fight: Some(PlayerId(2)),
                choose_mate: None,
                mate_answer: None,
            })
        );
    }
}
