//! Human-readable narrative of cage events.
//!
//! Every processed event produces exactly one line on the
//! [`NARRATIVE_TARGET`] tracing target. Narrative text is cosmetic: a mouse
//! or player that cannot be resolved is rendered with a fallback label and
//! never causes an error.

use cagewatch_types::{
    Behavior, CageEvent, FightOutcome, MateOutcome, Mouse, MouseId, PlayerId, Sex, Winners,
};

use crate::registry::{EntityRegistry, ParticipantOrder};

/// Tracing target for narrative lines.
pub const NARRATIVE_TARGET: &str = "cagewatch::narrative";

const NAME_COUNT: u64 = 12;

const FEMININE_NAMES: [&str; 12] = [
    "Monica", "Danielle", "Zena", "Brianna", "Katie", "Lacy", "Leela", "Suzy", "Saphira",
    "Missie", "Flo", "Lisa",
];

const MASCULINE_NAMES: [&str; 12] = [
    "Neil", "Chris", "Charlie", "Camden", "Rick", "Dean", "Xavier", "Zeke", "Han", "Samuel",
    "Wade", "Patrick",
];

const ROMAN_DIGITS: [(&str, u64); 13] = [
    ("M", 1000),
    ("CM", 900),
    ("D", 500),
    ("CD", 400),
    ("C", 100),
    ("XC", 90),
    ("L", 50),
    ("XL", 40),
    ("X", 10),
    ("IX", 9),
    ("V", 5),
    ("IV", 4),
    ("I", 1),
];

/// Which suffixes to append to a mouse name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameDetail {
    /// Append `(sex mate/answer/fight)` owner names.
    pub genes: bool,
    /// Append `[id:../size:../sex: ..]`.
    pub stats: bool,
}

impl NameDetail {
    /// Bare name.
    pub const PLAIN: Self = Self {
        genes: false,
        stats: false,
    };

    /// Name with genes and stats.
    pub const FULL: Self = Self {
        genes: true,
        stats: true,
    };
}

/// Roman numeral for `value`, or `None` outside `1..=3999`.
pub fn roman(value: u64) -> Option<String> {
    if !(1..4000).contains(&value) {
        return None;
    }
    let mut remaining = value;
    let mut numeral = String::new();
    for (symbol, weight) in ROMAN_DIGITS {
        while remaining >= weight {
            remaining = remaining.saturating_sub(weight);
            numeral.push_str(symbol);
        }
    }
    Some(numeral)
}

/// Display name of a player, falling back to `player {id}`.
pub fn player_label(players: &ParticipantOrder, player: PlayerId) -> String {
    players
        .name(player)
        .map_or_else(|| format!("player {player}"), ToOwned::to_owned)
}

/// A stable pet name for a mouse.
///
/// Females, and hermaphrodites with even ids, draw from the feminine list;
/// everyone else from the masculine list. Ids past the end of the list get a
/// Roman-numeral ordinal (`Zena II`).
pub fn mouse_name(mouse: &Mouse, players: &ParticipantOrder, detail: NameDetail) -> String {
    let id = mouse.id.into_inner();
    let feminine = match mouse.sex {
        Sex::Female => true,
        Sex::Male => false,
        Sex::Hermaphrodite => id.checked_rem(2) == Some(0),
    };
    let names = if feminine {
        &FEMININE_NAMES
    } else {
        &MASCULINE_NAMES
    };
    let base = id
        .checked_rem(NAME_COUNT)
        .and_then(|index| usize::try_from(index).ok())
        .and_then(|index| names.get(index))
        .copied()
        .unwrap_or("Mouse");

    let mut name = base.to_owned();
    let ordinal = id.checked_div(NAME_COUNT).unwrap_or(0).saturating_add(1);
    if ordinal > 1 {
        name.push(' ');
        name.push_str(&roman(ordinal).unwrap_or_else(|| ordinal.to_string()));
    }
    if detail.genes {
        name.push_str(&format!(
            " ({} {}/{}/{})",
            mouse.sex,
            player_label(players, mouse.owner(Behavior::ChooseMate)),
            player_label(players, mouse.owner(Behavior::MateAnswer)),
            player_label(players, mouse.owner(Behavior::PickFight)),
        ));
    }
    if detail.stats {
        name.push_str(&format!(
            " [id:{}/size:{}/sex: {}]",
            mouse.id, mouse.size, mouse.sex
        ));
    }
    name
}

/// Every attribute of a mouse on one line, for debug logs.
pub fn mouse_info(mouse: &Mouse) -> String {
    format!(
        "Mouse{}(sex:{}, size:{}, aggressiveness:{}, fertility:{}, pickFight:{}/chooseMate:{}/mateAnswer:{})",
        mouse.id,
        mouse.sex,
        mouse.size,
        mouse.start_aggressiveness,
        mouse.start_fertility,
        mouse.pick_fight_owner,
        mouse.choose_mate_owner,
        mouse.mate_answer_owner,
    )
}

/// Render the narrative line for `event`.
///
/// Must be called before the event is applied, while every mouse it
/// references is still live.
pub fn describe(event: &CageEvent, registry: &EntityRegistry) -> String {
    let players = registry.participants();
    let name = |id: MouseId| {
        registry.get(id).map_or_else(
            || format!("mouse {id}"),
            |mouse| mouse_name(mouse, players, NameDetail::PLAIN),
        )
    };
    let full_name = |id: MouseId| {
        registry.get(id).map_or_else(
            || format!("mouse {id}"),
            |mouse| mouse_name(mouse, players, NameDetail::FULL),
        )
    };

    match event {
        CageEvent::Add { mouse } => format!(
            "{} added to game.",
            mouse_name(mouse, players, NameDetail::FULL)
        ),
        CageEvent::StartGame => String::from("The game begins."),
        CageEvent::Fight { id, outcome } => {
            let me = name(*id);
            match *outcome {
                FightOutcome::NoFight => format!("{me} elected to never fight again."),
                FightOutcome::Invalid => format!("{me} is confused and won't fight again."),
                FightOutcome::SelfTarget => format!(
                    "{me} chose itself when asked whom to fight with. {me} is being executed to put it out of its misery."
                ),
                FightOutcome::Win { opponent } => {
                    format!("{me} fights and kills {}.", name(opponent))
                }
                FightOutcome::Tie { opponent } => {
                    format!("{me} fights {} to a draw.", name(opponent))
                }
                FightOutcome::Loss { opponent } => {
                    format!("{me} fights and is killed by {}.", name(opponent))
                }
            }
        }
        CageEvent::Mate { id, outcome } => {
            let me = name(*id);
            match outcome {
                MateOutcome::NoMate => format!("{me} elected to never mate again."),
                MateOutcome::Invalid => format!("{me} is confused and won't mate again."),
                MateOutcome::SelfTarget => format!("{me} caught trying to mate with itself."),
                MateOutcome::Incompatible { partner } => {
                    let sex = registry
                        .get(*id)
                        .map_or_else(String::new, |mouse| format!(", another {}", mouse.sex));
                    format!("{me} tried to mate with {}{sex}.", name(*partner))
                }
                MateOutcome::Infertile { partner } => {
                    let other = name(*partner);
                    format!("Mating between {me} and {other} failed because {other} is sterile.")
                }
                MateOutcome::MateExploded { partner } => {
                    format!("{} exploded after {me} asked it out.", name(*partner))
                }
                MateOutcome::Rejection { partner } => {
                    format!("{me} asked {} to mate. The answer is NO!", name(*partner))
                }
                MateOutcome::Success { partner, offspring } => format!(
                    "{} asked {} to mate. The answer is YES! {} was born!",
                    full_name(*id),
                    full_name(*partner),
                    mouse_name(offspring, players, NameDetail::FULL),
                ),
            }
        }
        CageEvent::Retire { id } => format!("{} dies after a productive life.", name(*id)),
        CageEvent::Overpopulation { id } => format!(
            "Cage has gotten too cramped. {} can't compete with the younger mice and dies.",
            name(*id)
        ),
        CageEvent::Explode { id, source, cause } => {
            format!("{} exploded in {source} because {cause}.", name(*id))
        }
        CageEvent::Spin { id, source } => {
            format!("{} spun in circles after {source} was called.", name(*id))
        }
        CageEvent::EndGame { cause, winners } => end_line(cause, winners, players),
    }
}

fn end_line(cause: &str, winners: &Winners, players: &ParticipantOrder) -> String {
    let winner = |player: Option<PlayerId>| {
        player.map_or_else(|| String::from("none"), |id| player_label(players, id))
    };
    format!(
        "Game ended because {cause}. Pick fight winner: {}, choose mate winner: {}, mate answer winner: {}.",
        winner(winners.pick_fight),
        winner(winners.choose_mate),
        winner(winners.mate_answer),
    )
}

/// Log the narrative line for `event` at `round`.
pub fn narrate(event: &CageEvent, registry: &EntityRegistry, round: u64) {
    let line = describe(event, registry);
    tracing::info!(target: NARRATIVE_TARGET, round, kind = event.kind(), "{line}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use cagewatch_types::Participant;

    use super::*;

    fn players() -> Vec<Participant> {
        vec![
            Participant {
                id: PlayerId(1),
                name: String::from("Ada"),
            },
            Participant {
                id: PlayerId(2),
                name: String::from("Bo"),
            },
        ]
    }

    fn mouse(id: u64, sex: Sex) -> Mouse {
        Mouse {
            id: MouseId(id),
            sex,
            size: 40,
            start_aggressiveness: 2,
            start_fertility: 5,
            pick_fight_owner: PlayerId(1),
            choose_mate_owner: PlayerId(2),
            mate_answer_owner: PlayerId(1),
        }
    }

    #[test]
    fn roman_numerals() {
        assert_eq!(roman(2).as_deref(), Some("II"));
        assert_eq!(roman(14).as_deref(), Some("XIV"));
        assert_eq!(roman(1994).as_deref(), Some("MCMXCIV"));
        assert_eq!(roman(0), None);
        assert_eq!(roman(4000), None);
    }

    #[test]
    fn names_follow_sex_and_ordinal() {
        let order = ParticipantOrder::new(&players()).unwrap();
        assert_eq!(mouse_name(&mouse(2, Sex::Female), &order, NameDetail::PLAIN), "Zena");
        assert_eq!(mouse_name(&mouse(2, Sex::Male), &order, NameDetail::PLAIN), "Charlie");
        assert_eq!(
            mouse_name(&mouse(14, Sex::Female), &order, NameDetail::PLAIN),
            "Zena II"
        );
        assert_eq!(
            mouse_name(&mouse(4, Sex::Hermaphrodite), &order, NameDetail::PLAIN),
            "Katie"
        );
        assert_eq!(
            mouse_name(&mouse(5, Sex::Hermaphrodite), &order, NameDetail::PLAIN),
            "Dean"
        );
    }

    #[test]
    fn hermaphrodite_names_alternate_by_id_parity() {
        let order = ParticipantOrder::new(&players()).unwrap();
        let names: Vec<String> = (0..4)
            .map(|id| mouse_name(&mouse(id, Sex::Hermaphrodite), &order, NameDetail::PLAIN))
            .collect();
        let feminine: Vec<String> = (0..4)
            .map(|id| mouse_name(&mouse(id, Sex::Female), &order, NameDetail::PLAIN))
            .collect();
        assert_eq!(names[0], feminine[0]);
        assert_eq!(names[1], "Chris");
        assert_eq!(names[2], feminine[2]);
        assert_eq!(names[3], "Camden");
    }

    #[test]
    fn full_name_lists_genes_then_stats() {
        let order = ParticipantOrder::new(&players()).unwrap();
        let name = mouse_name(&mouse(0, Sex::Male), &order, NameDetail::FULL);
        assert_eq!(name, "Neil (Male Bo/Ada/Ada) [id:0/size:40/sex: Male]");
    }

    #[test]
    fn unknown_player_falls_back_to_id() {
        let order = ParticipantOrder::new(&[]).unwrap();
        assert_eq!(player_label(&order, PlayerId(9)), "player 9");
    }

    #[test]
    fn describe_resolves_live_mice() {
        let mut registry = EntityRegistry::new(&players()).unwrap();
        registry.add_entity(mouse(0, Sex::Male)).unwrap();
        registry.add_entity(mouse(1, Sex::Male)).unwrap();

        let line = describe(
            &CageEvent::Fight {
                id: MouseId(0),
                outcome: FightOutcome::Win {
                    opponent: MouseId(1),
                },
            },
            &registry,
        );
        assert_eq!(line, "Neil fights and kills Chris.");
    }

    #[test]
    fn describe_never_fails_on_missing_mouse() {
        let registry = EntityRegistry::new(&players()).unwrap();
        let line = describe(&CageEvent::Retire { id: MouseId(42) }, &registry);
        assert_eq!(line, "mouse 42 dies after a productive life.");
    }

    #[test]
    fn end_line_names_winners() {
        let registry = EntityRegistry::new(&players()).unwrap();
        let line = describe(
            &CageEvent::EndGame {
                cause: String::from("time ran out"),
                winners: Winners {
                    pick_fight: Some(PlayerId(2)),
                    choose_mate: None,
                    mate_answer: Some(PlayerId(7)),
                },
            },
            &registry,
        );
        assert_eq!(
            line,
            "Game ended because time ran out. Pick fight winner: Bo, choose mate winner: none, mate answer winner: player 7."
        );
    }
}
