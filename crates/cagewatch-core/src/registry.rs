//! Entity registry: the live mouse table and its running counts.
//!
//! The registry is the single owner of every statistic the charts read.
//! It keeps four count tables alongside the mouse table:
//!
//! - mice per [`Sex`]
//! - mice per owner of each [`Behavior`], one column per participant
//!
//! Counts only change through [`EntityRegistry::add_entity`] and
//! [`EntityRegistry::remove_entity`], and both validate every slot they
//! touch before writing, so a rejected call leaves the registry untouched.
//! For every category `c`, `count[c]` equals the number of live mice whose
//! attribute equals `c`; [`EntityRegistry::verify_counts`] recounts from
//! scratch to prove it.

use std::collections::{BTreeMap, HashMap};

use cagewatch_types::{Behavior, Metric, Mouse, MouseId, Participant, PlayerId, Sex};
use serde::Serialize;

/// Errors raised by registry operations.
///
/// All of these are contract violations by the event producer (or, for the
/// count variants, internal inconsistencies). None are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A mouse with this id is already live.
    #[error("mouse {id} is already in the cage")]
    DuplicateEntity {
        /// The duplicated id.
        id: MouseId,
    },

    /// No live mouse has this id.
    #[error("mouse {id} is not in the cage")]
    UnknownEntity {
        /// The missing id.
        id: MouseId,
    },

    /// A mouse names an owner that is not in the participant directory.
    #[error("mouse {id} has {behavior:?} owner {player}, which is not a known player")]
    UnknownParticipant {
        /// The mouse carrying the reference.
        id: MouseId,
        /// The behavior whose owner failed to resolve.
        behavior: Behavior,
        /// The unresolved player.
        player: PlayerId,
    },

    /// The participant directory lists the same player twice.
    #[error("player {player} appears more than once in the participant directory")]
    DuplicateParticipant {
        /// The repeated player.
        player: PlayerId,
    },

    /// Removing a mouse would drive a count below zero.
    #[error("removing mouse {id} would drive a count below zero")]
    CountUnderflow {
        /// The mouse being removed.
        id: MouseId,
    },

    /// Adding a mouse would overflow a count.
    #[error("adding mouse {id} would overflow a count")]
    CountOverflow {
        /// The mouse being added.
        id: MouseId,
    },

    /// A recorded count disagrees with a recount of the live mice.
    #[error("{metric:?} count for {column} is {recorded}, but {actual} live mice match")]
    CountMismatch {
        /// The table holding the bad count.
        metric: Metric,
        /// Column label (sex label or player id).
        column: String,
        /// The stored count.
        recorded: u32,
        /// The recounted value.
        actual: u32,
    },
}

// ---------------------------------------------------------------------------
// ParticipantOrder
// ---------------------------------------------------------------------------

/// The ordered participant directory, fixed at reset.
///
/// Position in this list is the column index of every owner count table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantOrder {
    players: Vec<Participant>,
    positions: HashMap<PlayerId, usize>,
}

impl ParticipantOrder {
    /// Build the order from a directory listing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateParticipant`] if a player id
    /// appears twice.
    pub fn new(directory: &[Participant]) -> Result<Self, RegistryError> {
        let mut positions = HashMap::with_capacity(directory.len());
        for (position, participant) in directory.iter().enumerate() {
            if positions.insert(participant.id, position).is_some() {
                return Err(RegistryError::DuplicateParticipant {
                    player: participant.id,
                });
            }
        }
        Ok(Self {
            players: directory.to_vec(),
            positions,
        })
    }

    /// Column index of a player, if known.
    pub fn position(&self, player: PlayerId) -> Option<usize> {
        self.positions.get(&player).copied()
    }

    /// Display name of a player, if known.
    pub fn name(&self, player: PlayerId) -> Option<&str> {
        self.position(player)
            .and_then(|position| self.players.get(position))
            .map(|participant| participant.name.as_str())
    }

    /// Number of participants (owner table width).
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Participants in column order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.players.iter()
    }
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Live mice per sex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexCounts {
    /// Live hermaphrodites.
    pub hermaphrodite: u32,
    /// Live males.
    pub male: u32,
    /// Live females.
    pub female: u32,
}

impl SexCounts {
    /// Count for one sex.
    pub const fn get(&self, sex: Sex) -> u32 {
        match sex {
            Sex::Hermaphrodite => self.hermaphrodite,
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }

    const fn slot_mut(&mut self, sex: Sex) -> &mut u32 {
        match sex {
            Sex::Hermaphrodite => &mut self.hermaphrodite,
            Sex::Male => &mut self.male,
            Sex::Female => &mut self.female,
        }
    }

    /// Counts in [`Sex::ALL`] order.
    pub const fn ordered(self) -> [u32; 3] {
        [self.hermaphrodite, self.male, self.female]
    }
}

/// An owned copy of every count table, taken at emission time.
///
/// Owner vectors are indexed by [`ParticipantOrder`] position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountSnapshot {
    /// Live mice per sex.
    pub population: SexCounts,
    /// Live mice per pick-fight owner.
    pub pick_fight: Vec<u32>,
    /// Live mice per choose-mate owner.
    pub choose_mate: Vec<u32>,
    /// Live mice per mate-answer owner.
    pub mate_answer: Vec<u32>,
}

impl CountSnapshot {
    /// Owner counts for one behavior.
    pub fn owners(&self, behavior: Behavior) -> &[u32] {
        match behavior {
            Behavior::PickFight => &self.pick_fight,
            Behavior::ChooseMate => &self.choose_mate,
            Behavior::MateAnswer => &self.mate_answer,
        }
    }

    /// The values of one chart row for `metric`, in column order (without
    /// the round column).
    pub fn values(&self, metric: Metric) -> Vec<u32> {
        match metric.behavior() {
            None => self.population.ordered().to_vec(),
            Some(behavior) => self.owners(behavior).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
}

impl Step {
    const fn apply(self, value: u32) -> Option<u32> {
        match self {
            Self::Up => value.checked_add(1),
            Self::Down => value.checked_sub(1),
        }
    }

    const fn failure(self, id: MouseId) -> RegistryError {
        match self {
            Self::Up => RegistryError::CountOverflow { id },
            Self::Down => RegistryError::CountUnderflow { id },
        }
    }
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// The live mouse table plus its four count tables.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    mice: BTreeMap<MouseId, Mouse>,
    order: ParticipantOrder,
    sexes: SexCounts,
    pick_fight: Vec<u32>,
    choose_mate: Vec<u32>,
    mate_answer: Vec<u32>,
}

impl EntityRegistry {
    /// Create an empty registry for the given participant directory.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateParticipant`] if the directory is
    /// not a set.
    pub fn new(directory: &[Participant]) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        registry.reset(directory)?;
        Ok(registry)
    }

    /// Drop every mouse, rebuild the participant order, and zero all counts.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateParticipant`] if the directory is
    /// not a set. The registry is left unchanged in that case.
    pub fn reset(&mut self, directory: &[Participant]) -> Result<(), RegistryError> {
        let order = ParticipantOrder::new(directory)?;
        let width = order.len();
        self.mice.clear();
        self.order = order;
        self.sexes = SexCounts::default();
        self.pick_fight = vec![0; width];
        self.choose_mate = vec![0; width];
        self.mate_answer = vec![0; width];
        Ok(())
    }

    /// Insert a mouse and count it under its sex and its three owners.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateEntity`] if the id is already live.
    /// - [`RegistryError::UnknownParticipant`] if an owner is not in the
    ///   directory.
    pub fn add_entity(&mut self, mouse: Mouse) -> Result<(), RegistryError> {
        self.ensure_insertable(&mouse)?;
        self.adjust(&mouse, Step::Up)?;
        self.mice.insert(mouse.id, mouse);
        Ok(())
    }

    /// Remove a mouse and uncount it. Returns the removed record.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownEntity`] if the id is not live.
    /// - [`RegistryError::CountUnderflow`] if a count is already zero.
    pub fn remove_entity(&mut self, id: MouseId) -> Result<Mouse, RegistryError> {
        let mouse = self.ensure_live(id)?.clone();
        self.adjust(&mouse, Step::Down)?;
        self.mice.remove(&id);
        Ok(mouse)
    }

    /// Check that `mouse` could be added without error, without adding it.
    ///
    /// # Errors
    ///
    /// Same as [`add_entity`](Self::add_entity).
    pub fn ensure_insertable(&self, mouse: &Mouse) -> Result<(), RegistryError> {
        if self.mice.contains_key(&mouse.id) {
            return Err(RegistryError::DuplicateEntity { id: mouse.id });
        }
        self.owner_columns(mouse).map(|_| ())
    }

    /// Look up a live mouse, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownEntity`] if the id is not live.
    pub fn ensure_live(&self, id: MouseId) -> Result<&Mouse, RegistryError> {
        self.mice.get(&id).ok_or(RegistryError::UnknownEntity { id })
    }

    /// Look up a live mouse.
    pub fn get(&self, id: MouseId) -> Option<&Mouse> {
        self.mice.get(&id)
    }

    /// Whether a mouse is live.
    pub fn contains(&self, id: MouseId) -> bool {
        self.mice.contains_key(&id)
    }

    /// Number of live mice.
    pub fn len(&self) -> usize {
        self.mice.len()
    }

    /// Whether the cage is empty.
    pub fn is_empty(&self) -> bool {
        self.mice.is_empty()
    }

    /// Live mice in id order.
    pub fn mice(&self) -> impl Iterator<Item = &Mouse> {
        self.mice.values()
    }

    /// The participant directory in column order.
    pub const fn participants(&self) -> &ParticipantOrder {
        &self.order
    }

    /// Live mice of one sex.
    pub const fn sex_count(&self, sex: Sex) -> u32 {
        self.sexes.get(sex)
    }

    /// Live mice whose `behavior` is owned by `player`, or `None` if the
    /// player is unknown.
    pub fn owner_count(&self, behavior: Behavior, player: PlayerId) -> Option<u32> {
        let position = self.order.position(player)?;
        self.owner_table(behavior).get(position).copied()
    }

    /// Take an owned copy of every count table.
    pub fn snapshot(&self) -> CountSnapshot {
        CountSnapshot {
            population: self.sexes,
            pick_fight: self.pick_fight.clone(),
            choose_mate: self.choose_mate.clone(),
            mate_answer: self.mate_answer.clone(),
        }
    }

    /// Recount every table from the live mice and compare with the stored
    /// counts.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CountMismatch`] for the first disagreement.
    pub fn verify_counts(&self) -> Result<(), RegistryError> {
        let width = self.order.len();
        let mut sexes = SexCounts::default();
        let mut owners: BTreeMap<Behavior, Vec<u32>> = Behavior::ALL
            .into_iter()
            .map(|behavior| (behavior, vec![0; width]))
            .collect();

        for mouse in self.mice.values() {
            let slot = sexes.slot_mut(mouse.sex);
            *slot = slot.saturating_add(1);
            let columns = self.owner_columns(mouse)?;
            for (behavior, column) in Behavior::ALL.into_iter().zip(columns) {
                if let Some(cell) = owners
                    .get_mut(&behavior)
                    .and_then(|table| table.get_mut(column))
                {
                    *cell = cell.saturating_add(1);
                }
            }
        }

        for sex in Sex::ALL {
            let (recorded, actual) = (self.sexes.get(sex), sexes.get(sex));
            if recorded != actual {
                return Err(RegistryError::CountMismatch {
                    metric: Metric::Population,
                    column: sex.label().to_owned(),
                    recorded,
                    actual,
                });
            }
        }

        for metric in Metric::ALL {
            let Some(behavior) = metric.behavior() else {
                continue;
            };
            let recounted = owners.get(&behavior).map_or(&[][..], Vec::as_slice);
            let stored = self.owner_table(behavior);
            for ((participant, recorded), actual) in
                self.order.iter().zip(stored).zip(recounted)
            {
                if recorded != actual {
                    return Err(RegistryError::CountMismatch {
                        metric,
                        column: participant.id.to_string(),
                        recorded: *recorded,
                        actual: *actual,
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve the owner columns of a mouse in [`Behavior::ALL`] order.
    fn owner_columns(&self, mouse: &Mouse) -> Result<[usize; 3], RegistryError> {
        let mut columns = [0; 3];
        for (slot, behavior) in columns.iter_mut().zip(Behavior::ALL) {
            let player = mouse.owner(behavior);
            *slot = self
                .order
                .position(player)
                .ok_or(RegistryError::UnknownParticipant {
                    id: mouse.id,
                    behavior,
                    player,
                })?;
        }
        Ok(columns)
    }

    fn owner_table(&self, behavior: Behavior) -> &[u32] {
        match behavior {
            Behavior::PickFight => &self.pick_fight,
            Behavior::ChooseMate => &self.choose_mate,
            Behavior::MateAnswer => &self.mate_answer,
        }
    }

    fn owner_table_mut(&mut self, behavior: Behavior) -> &mut Vec<u32> {
        match behavior {
            Behavior::PickFight => &mut self.pick_fight,
            Behavior::ChooseMate => &mut self.choose_mate,
            Behavior::MateAnswer => &mut self.mate_answer,
        }
    }

    /// Move the sex count and the three owner counts of `mouse` one step.
    ///
    /// Every new value is computed before any is written.
    fn adjust(&mut self, mouse: &Mouse, step: Step) -> Result<(), RegistryError> {
        let columns = self.owner_columns(mouse)?;

        let sex_next = step
            .apply(self.sexes.get(mouse.sex))
            .ok_or_else(|| step.failure(mouse.id))?;

        let mut owner_next = [0_u32; 3];
        for ((next, behavior), column) in owner_next.iter_mut().zip(Behavior::ALL).zip(columns) {
            let current = self
                .owner_table(behavior)
                .get(column)
                .copied()
                .ok_or(RegistryError::UnknownParticipant {
                    id: mouse.id,
                    behavior,
                    player: mouse.owner(behavior),
                })?;
            *next = step.apply(current).ok_or_else(|| step.failure(mouse.id))?;
        }

        *self.sexes.slot_mut(mouse.sex) = sex_next;
        for ((behavior, column), value) in Behavior::ALL.into_iter().zip(columns).zip(owner_next) {
            if let Some(cell) = self.owner_table_mut(behavior).get_mut(column) {
                *cell = value;
            }
        }
        Ok(())
    }
}
