//! Cage events: the records the simulation engine appends to its event
//! queue, one per observable state change.
//!
//! Events are internally tagged on the wire by a `type` field:
//!
//! ```json
//! {"type": "FIGHT", "id": 4, "outcome": {"result": "WIN", "opponent": 9}}
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::MouseId;
use crate::structs::{Mouse, Winners};

/// A single event emitted by the simulation engine.
///
/// Variants are tagged by kind; each kind carries only the fields that kind
/// needs, so an event can never reference an opponent or partner it does not
/// have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum CageEvent {
    /// A mouse entered the cage as part of the initial population.
    Add {
        /// The new mouse.
        mouse: Mouse,
    },
    /// The initial population is complete and rounds begin.
    StartGame,
    /// A mouse was asked whom to fight.
    Fight {
        /// The instigating mouse.
        id: MouseId,
        /// What happened.
        outcome: FightOutcome,
    },
    /// A mouse was asked whom to mate with.
    Mate {
        /// The proposing mouse.
        id: MouseId,
        /// What happened.
        outcome: MateOutcome,
    },
    /// A mouse died of old age.
    Retire {
        /// The retiring mouse.
        id: MouseId,
    },
    /// A mouse died because the cage exceeded its capacity.
    Overpopulation {
        /// The culled mouse.
        id: MouseId,
    },
    /// Player code threw an error while acting for a mouse; the mouse dies.
    Explode {
        /// The affected mouse.
        id: MouseId,
        /// Name of the behavior function that failed.
        source: String,
        /// Error message reported by the engine.
        cause: String,
    },
    /// Player code failed to terminate while acting for a mouse; the mouse
    /// dies.
    Spin {
        /// The affected mouse.
        id: MouseId,
        /// Name of the behavior function that did not return.
        source: String,
    },
    /// The game is over. No further events follow for this run.
    EndGame {
        /// Why the game ended.
        cause: String,
        /// Per-behavior winners.
        #[serde(default)]
        winners: Winners,
    },
}

impl CageEvent {
    /// Every wire tag, in declaration order.
    pub const KINDS: [&'static str; 9] = [
        "ADD",
        "START_GAME",
        "FIGHT",
        "MATE",
        "RETIRE",
        "OVERPOPULATION",
        "EXPLODE",
        "SPIN",
        "END_GAME",
    ];

    /// The wire tag of this event.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "ADD",
            Self::StartGame => "START_GAME",
            Self::Fight { .. } => "FIGHT",
            Self::Mate { .. } => "MATE",
            Self::Retire { .. } => "RETIRE",
            Self::Overpopulation { .. } => "OVERPOPULATION",
            Self::Explode { .. } => "EXPLODE",
            Self::Spin { .. } => "SPIN",
            Self::EndGame { .. } => "END_GAME",
        }
    }

    /// Whether this is an arrival event. Arrivals never advance the round.
    pub const fn is_arrival(&self) -> bool {
        matches!(self, Self::Add { .. })
    }
}

/// Result of asking a mouse to pick a fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum FightOutcome {
    /// The mouse chose not to fight, and never will again.
    #[serde(rename = "NONE")]
    NoFight,
    /// The mouse returned an invalid choice and will not fight again.
    Invalid,
    /// The mouse chose itself and is put down.
    #[serde(rename = "SELF")]
    SelfTarget,
    /// The instigator killed its opponent.
    Win {
        /// The losing opponent.
        opponent: MouseId,
    },
    /// The fight was a draw; nobody dies.
    Tie {
        /// The opponent.
        opponent: MouseId,
    },
    /// The instigator was killed by its opponent.
    Loss {
        /// The winning opponent.
        opponent: MouseId,
    },
}

impl FightOutcome {
    /// The opponent referenced by this outcome, if any.
    pub const fn opponent(self) -> Option<MouseId> {
        match self {
            Self::Win { opponent } | Self::Tie { opponent } | Self::Loss { opponent } => {
                Some(opponent)
            }
            Self::NoFight | Self::Invalid | Self::SelfTarget => None,
        }
    }
}

/// Result of asking a mouse to choose a mate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum MateOutcome {
    /// The mouse chose not to mate, and never will again.
    #[serde(rename = "NONE")]
    NoMate,
    /// The mouse returned an invalid choice and will not mate again.
    Invalid,
    /// The mouse tried to mate with itself.
    #[serde(rename = "SELF")]
    SelfTarget,
    /// The partner has an incompatible sex.
    Incompatible {
        /// The asked mouse.
        partner: MouseId,
    },
    /// The partner is out of fertility.
    Infertile {
        /// The asked mouse.
        partner: MouseId,
    },
    /// Player code answering for the partner failed; the partner dies.
    MateExploded {
        /// The asked mouse.
        partner: MouseId,
    },
    /// The partner said no.
    Rejection {
        /// The asked mouse.
        partner: MouseId,
    },
    /// The partner said yes and a new mouse was born.
    Success {
        /// The asked mouse.
        partner: MouseId,
        /// The newborn.
        offspring: Mouse,
    },
}

impl MateOutcome {
    /// The partner referenced by this outcome, if any.
    pub const fn partner(&self) -> Option<MouseId> {
        match self {
            Self::Incompatible { partner }
            | Self::Infertile { partner }
            | Self::MateExploded { partner }
            | Self::Rejection { partner }
            | Self::Success { partner, .. } => Some(*partner),
            Self::NoMate | Self::Invalid | Self::SelfTarget => None,
        }
    }
}
