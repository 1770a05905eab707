//! Event processor: the cage event state machine.
//!
//! Consumes events one at a time in arrival order. Handling an event runs
//! four steps, and the event is retired only after all of them complete:
//!
//! 1. **Validate** every mouse the event references (no mutation yet)
//! 2. **Narrate** the event while every referenced mouse is still live
//! 3. **Apply** the registry side effects
//! 4. **Emit** a chart row for the new round (non-arrival events only)
//!
//! Because validation happens first, an event that names an unknown or
//! duplicate mouse is rejected with the registry exactly as it was.

use cagewatch_types::{CageEvent, FightOutcome, MateOutcome, Participant, Winners};
use serde::Serialize;
use tracing::{debug, info};

use crate::narrative;
use crate::queue::EventQueue;
use crate::registry::{EntityRegistry, RegistryError};
use crate::series::{SeriesAggregator, SeriesError};

/// Errors raised while processing events. All of them are fatal for the
/// current run.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The event conflicts with the live mouse table.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },

    /// A chart row could not be appended.
    #[error("series error: {source}")]
    Series {
        /// The underlying series error.
        #[from]
        source: SeriesError,
    },

    /// An event arrived after `END_GAME`.
    #[error("{kind} event received after the game ended")]
    RunAlreadyEnded {
        /// Kind of the rejected event.
        kind: &'static str,
    },

    /// The round counter cannot advance any further.
    #[error("round counter overflowed")]
    RoundOverflow,
}

/// How a run ended, as reported by the `END_GAME` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Why the engine ended the game.
    pub cause: String,
    /// Per-behavior winners.
    pub winners: Winners,
    /// The round recorded for the `END_GAME` event.
    pub round: u64,
}

/// The cage event state machine.
#[derive(Debug, Clone)]
pub struct EventProcessor {
    registry: EntityRegistry,
    series: SeriesAggregator,
    round: u64,
    processed: u64,
    outcome: Option<RunOutcome>,
    verify_counts: bool,
}

impl EventProcessor {
    /// Create a processor with an empty cage for `directory`.
    pub fn new(directory: &[Participant]) -> Result<Self, ProcessError> {
        let registry = EntityRegistry::new(directory)?;
        let series = SeriesAggregator::new(registry.participants());
        Ok(Self {
            registry,
            series,
            round: 0,
            processed: 0,
            outcome: None,
            verify_counts: false,
        })
    }

    /// Recount every table from scratch after each event. Slow; meant for
    /// tests and debugging.
    pub const fn set_count_verification(&mut self, enabled: bool) {
        self.verify_counts = enabled;
    }

    /// Clear the cage, the round counter, the chart tables, and the run
    /// outcome, and adopt a new participant directory.
    ///
    /// A rejected directory leaves the processor unchanged.
    pub fn reset(&mut self, directory: &[Participant]) -> Result<(), ProcessError> {
        self.registry.reset(directory)?;
        self.series.reset(self.registry.participants());
        self.round = 0;
        self.processed = 0;
        self.outcome = None;
        Ok(())
    }

    /// Process every event currently in `queue`, in order. Returns the
    /// number processed.
    ///
    /// Stops at the first failure; the failing event is consumed.
    pub fn drain(&mut self, queue: &mut EventQueue) -> Result<usize, ProcessError> {
        let mut drained: usize = 0;
        while let Some(event) = queue.next_event() {
            self.process(event)?;
            drained = drained.saturating_add(1);
        }
        if drained > 0 {
            debug!(drained, round = self.round, live = self.registry.len(), "Drained events");
        }
        Ok(drained)
    }

    /// Process a single event.
    pub fn process(&mut self, event: CageEvent) -> Result<(), ProcessError> {
        if self.outcome.is_some() {
            return Err(ProcessError::RunAlreadyEnded { kind: event.kind() });
        }
        self.validate(&event)?;
        let next_round = if event.is_arrival() {
            None
        } else {
            Some(self.round.checked_add(1).ok_or(ProcessError::RoundOverflow)?)
        };

        narrative::narrate(&event, &self.registry, self.round);
        self.apply(event, next_round)?;

        if let Some(round) = next_round {
            self.round = round;
            self.series.emit(&self.registry.snapshot(), round)?;
        }
        if self.verify_counts {
            self.registry.verify_counts()?;
        }
        self.processed = self.processed.saturating_add(1);
        Ok(())
    }

    /// Check that every mouse the event references exists (or, for new
    /// mice, does not yet exist).
    fn validate(&self, event: &CageEvent) -> Result<(), RegistryError> {
        match event {
            CageEvent::Add { mouse } => self.registry.ensure_insertable(mouse),
            CageEvent::StartGame | CageEvent::EndGame { .. } => Ok(()),
            CageEvent::Fight { id, outcome } => {
                self.registry.ensure_live(*id)?;
                if let Some(opponent) = outcome.opponent() {
                    self.registry.ensure_live(opponent)?;
                }
                Ok(())
            }
            CageEvent::Mate { id, outcome } => {
                self.registry.ensure_live(*id)?;
                if let Some(partner) = outcome.partner() {
                    self.registry.ensure_live(partner)?;
                }
                if let MateOutcome::Success { offspring, .. } = outcome {
                    self.registry.ensure_insertable(offspring)?;
                }
                Ok(())
            }
            CageEvent::Retire { id }
            | CageEvent::Overpopulation { id }
            | CageEvent::Explode { id, .. }
            | CageEvent::Spin { id, .. } => self.registry.ensure_live(*id).map(|_| ()),
        }
    }

    fn apply(&mut self, event: CageEvent, next_round: Option<u64>) -> Result<(), ProcessError> {
        match event {
            CageEvent::Add { mouse } => {
                debug!(mouse = %narrative::mouse_info(&mouse), "Mouse added");
                self.registry.add_entity(mouse)?;
            }
            CageEvent::StartGame => {
                // Initial population row; only the first start of a run has one.
                if self.series.row_count() == 0 {
                    self.series.emit(&self.registry.snapshot(), self.round)?;
                }
            }
            CageEvent::Fight { id, outcome } => match outcome {
                FightOutcome::SelfTarget | FightOutcome::Loss { .. } => {
                    self.registry.remove_entity(id)?;
                }
                FightOutcome::Win { opponent } => {
                    self.registry.remove_entity(opponent)?;
                }
                FightOutcome::NoFight | FightOutcome::Invalid | FightOutcome::Tie { .. } => {}
            },
            CageEvent::Mate { outcome, .. } => match outcome {
                MateOutcome::MateExploded { partner } => {
                    self.registry.remove_entity(partner)?;
                }
                MateOutcome::Success { offspring, .. } => {
                    self.registry.add_entity(offspring)?;
                }
                MateOutcome::NoMate
                | MateOutcome::Invalid
                | MateOutcome::SelfTarget
                | MateOutcome::Incompatible { .. }
                | MateOutcome::Infertile { .. }
                | MateOutcome::Rejection { .. } => {}
            },
            CageEvent::Retire { id }
            | CageEvent::Overpopulation { id }
            | CageEvent::Explode { id, .. }
            | CageEvent::Spin { id, .. } => {
                self.registry.remove_entity(id)?;
            }
            CageEvent::EndGame { cause, winners } => {
                let round = next_round.unwrap_or(self.round);
                info!(%cause, round, live = self.registry.len(), "Game ended");
                self.outcome = Some(RunOutcome {
                    cause,
                    winners,
                    round,
                });
            }
        }
        Ok(())
    }

    /// The live mouse table.
    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The chart tables.
    pub const fn series(&self) -> &SeriesAggregator {
        &self.series
    }

    /// Current round: the number of non-arrival events since reset.
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Number of events processed since reset.
    pub const fn processed(&self) -> u64 {
        self.processed
    }

    /// How the run ended, once `END_GAME` has been processed.
    pub const fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Whether `END_GAME` has been processed.
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}
