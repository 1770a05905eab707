//! The visualization: a processor, its inbound queue, and a render surface,
//! driven as one frame.
//!
//! Every frame redraws the charts first and then drains the queue, so the
//! surface always shows the state as of the previous frame's drain. The
//! visualization finishes once the game has ended or the producer has hung
//! up, after the final state has been drawn.
//!
//! [`VisualizationSession`] adds the lifecycle controls (`start`, `stop`,
//! `reset`) on top of a [`FrameScheduler`].

use cagewatch_types::Participant;
use tracing::{debug, info, warn};

use crate::processor::{EventProcessor, ProcessError};
use crate::queue::EventQueue;
use crate::scheduler::{
    Frame, FrameScheduler, FrameStatus, LoopEnd, SchedulerError, StopHandle,
};
use crate::series::SeriesAggregator;

/// Errors raised by the visualization lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum VisualizationError {
    /// Event processing failed.
    #[error("event processing failed: {source}")]
    Process {
        /// The underlying processing error.
        #[from]
        source: ProcessError,
    },

    /// The frame loop could not be controlled.
    #[error("frame scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },

    /// The loop task panicked and took the visualization with it. The
    /// session can no longer be started or reset.
    #[error("visualization was lost when the frame loop task failed")]
    Lost,
}

/// Consumer of chart tables. Owns its own redraw logic.
pub trait RenderSurface: Send + 'static {
    /// Redraw every chart from the current tables. Called once per frame
    /// whether or not rows were appended.
    fn redraw(&mut self, charts: &SeriesAggregator);
}

/// A processor wired to its queue and surface.
#[derive(Debug)]
pub struct Visualization<S> {
    processor: EventProcessor,
    queue: EventQueue,
    surface: S,
}

impl<S: RenderSurface> Visualization<S> {
    /// Build empty charts for `directory` and draw them once.
    pub fn init(
        directory: &[Participant],
        mut surface: S,
        queue: EventQueue,
    ) -> Result<Self, VisualizationError> {
        let processor = EventProcessor::new(directory)?;
        surface.redraw(processor.series());
        info!(players = directory.len(), "Visualization initialized");
        Ok(Self {
            processor,
            queue,
            surface,
        })
    }

    /// Clear the cage, the round counter, and the charts, and switch to a
    /// fresh event queue.
    pub fn reset(
        &mut self,
        directory: &[Participant],
        queue: EventQueue,
    ) -> Result<(), VisualizationError> {
        self.processor.reset(directory)?;
        self.queue = queue;
        info!(players = directory.len(), "Visualization reset");
        Ok(())
    }

    /// Redraw the surface from the current tables.
    pub fn render(&mut self) {
        self.surface.redraw(self.processor.series());
    }

    /// Process every pending event.
    pub fn drain(&mut self) -> Result<usize, ProcessError> {
        self.processor.drain(&mut self.queue)
    }

    /// Whether nothing more can arrive: the game ended or the producer hung
    /// up with the queue empty.
    pub const fn is_done(&self) -> bool {
        self.processor.is_finished() || self.queue.is_closed()
    }

    /// The underlying processor.
    pub const fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    /// Mutable access to the processor, e.g. to enable count verification.
    pub const fn processor_mut(&mut self) -> &mut EventProcessor {
        &mut self.processor
    }

    /// The render surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: RenderSurface> Frame for Visualization<S> {
    type Error = ProcessError;

    fn frame(&mut self) -> Result<FrameStatus, ProcessError> {
        self.render();
        if self.is_done() {
            return Ok(FrameStatus::Finished);
        }
        self.drain()?;
        Ok(FrameStatus::Continue)
    }
}

/// Summary of a completed session run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRun {
    /// Frames that ran.
    pub ticks: u64,
    /// Why the loop ended.
    pub end: LoopEnd,
}

/// Lifecycle controls for a [`Visualization`].
///
/// While running, the scheduler owns the visualization; it comes back when
/// the loop is waited on or the session is reset.
#[derive(Debug)]
pub struct VisualizationSession<S: RenderSurface> {
    scheduler: FrameScheduler<Visualization<S>>,
    idle: Option<Visualization<S>>,
}

impl<S: RenderSurface> VisualizationSession<S> {
    /// Wrap `visualization` in an idle session running at `fps`.
    pub fn new(visualization: Visualization<S>, fps: u32) -> Result<Self, VisualizationError> {
        Self::with_stop_handle(visualization, fps, &StopHandle::new())
    }

    /// Like [`new`](Self::new), but stopped by `handle`. Lets a render
    /// surface built before the session hold a handle to its own loop.
    pub fn with_stop_handle(
        visualization: Visualization<S>,
        fps: u32,
        handle: &StopHandle,
    ) -> Result<Self, VisualizationError> {
        Ok(Self {
            scheduler: FrameScheduler::with_stop_handle(fps, handle)?,
            idle: Some(visualization),
        })
    }

    /// Start the frame loop. The first frame runs immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRunning`] if the loop has been
    /// started and not yet waited on, or [`VisualizationError::Lost`] after
    /// the loop task panicked.
    pub fn start(&mut self) -> Result<(), VisualizationError> {
        let visualization = self.take_idle()?;
        self.scheduler.start(visualization)?;
        Ok(())
    }

    /// Stop the frame loop. A no-op when idle.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// A handle that stops the loop, usable from inside a render callback.
    pub fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    /// Whether the frame loop is running.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Wait for the loop to end and take the visualization back.
    ///
    /// The visualization is returned to the session even when a frame
    /// failed, so the session can be reset and restarted. If the loop task
    /// itself panicked (for instance inside a render surface), the
    /// visualization is gone and later calls fail with
    /// [`VisualizationError::Lost`].
    pub async fn wait(&mut self) -> Result<SessionRun, VisualizationError> {
        let outcome = self.scheduler.join().await?;
        self.idle = Some(outcome.frame);
        let end = outcome.result?;
        Ok(SessionRun {
            ticks: outcome.ticks,
            end,
        })
    }

    /// Stop any running loop, then clear all state and switch to `queue`.
    pub async fn reset(
        &mut self,
        directory: &[Participant],
        queue: EventQueue,
    ) -> Result<(), VisualizationError> {
        if self.scheduler.is_started() {
            self.scheduler.stop();
            match self.wait().await {
                Ok(run) => debug!(ticks = run.ticks, "Loop stopped for reset"),
                Err(VisualizationError::Process { source }) => {
                    warn!(error = %source, "Discarding failed run on reset");
                }
                Err(other) => return Err(other),
            }
        }
        let visualization = self.idle.as_mut().ok_or(VisualizationError::Lost)?;
        visualization.reset(directory, queue)
    }

    fn take_idle(&mut self) -> Result<Visualization<S>, VisualizationError> {
        match self.idle.take() {
            Some(visualization) => Ok(visualization),
            None if self.scheduler.is_started() => Err(SchedulerError::AlreadyRunning.into()),
            None => Err(VisualizationError::Lost),
        }
    }

    /// The visualization, while the session is idle.
    pub const fn visualization(&self) -> Option<&Visualization<S>> {
        self.idle.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cagewatch_types::{CageEvent, Metric, Mouse, MouseId, PlayerId, Sex};

    use super::*;
    use crate::queue::event_channel;

    #[derive(Debug, Default)]
    struct CountingSurface {
        redraws: u32,
        last_rows: usize,
    }

    impl RenderSurface for CountingSurface {
        fn redraw(&mut self, charts: &SeriesAggregator) {
            self.redraws = self.redraws.saturating_add(1);
            self.last_rows = charts.row_count();
        }
    }

    fn directory() -> Vec<Participant> {
        vec![Participant {
            id: PlayerId(1),
            name: String::from("Solo"),
        }]
    }

    fn mouse(id: u64) -> Mouse {
        Mouse {
            id: MouseId(id),
            sex: Sex::Female,
            size: 10,
            start_aggressiveness: 1,
            start_fertility: 1,
            pick_fight_owner: PlayerId(1),
            choose_mate_owner: PlayerId(1),
            mate_answer_owner: PlayerId(1),
        }
    }

    #[test]
    fn init_draws_empty_charts() {
        let (_sender, queue) = event_channel();
        let visualization =
            Visualization::init(&directory(), CountingSurface::default(), queue).unwrap();
        assert_eq!(visualization.surface().redraws, 1);
        assert_eq!(visualization.surface().last_rows, 0);
        let table = visualization
            .processor()
            .series()
            .table(Metric::PickFight)
            .unwrap();
        assert_eq!(table.columns(), ["Time", "Solo"]);
    }

    #[test]
    fn frame_renders_before_draining() {
        let (sender, queue) = event_channel();
        let mut visualization =
            Visualization::init(&directory(), CountingSurface::default(), queue).unwrap();
        sender.send(CageEvent::Add { mouse: mouse(1) }).unwrap();
        sender.send(CageEvent::StartGame).unwrap();

        assert_eq!(visualization.frame().unwrap(), FrameStatus::Continue);
        assert_eq!(visualization.surface().last_rows, 0);
        assert_eq!(visualization.frame().unwrap(), FrameStatus::Continue);
        assert_eq!(visualization.surface().last_rows, 2);
    }

    #[test]
    fn frame_finishes_after_drawing_final_state() {
        let queue = EventQueue::from_events([CageEvent::Add { mouse: mouse(1) }, CageEvent::StartGame]);
        let mut visualization =
            Visualization::init(&directory(), CountingSurface::default(), queue).unwrap();

        assert_eq!(visualization.frame().unwrap(), FrameStatus::Continue);
        assert_eq!(visualization.frame().unwrap(), FrameStatus::Finished);
        assert_eq!(visualization.surface().last_rows, 2);
    }

    #[test]
    fn reset_installs_fresh_queue() {
        let queue = EventQueue::from_events([CageEvent::Add { mouse: mouse(1) }, CageEvent::StartGame]);
        let mut visualization =
            Visualization::init(&directory(), CountingSurface::default(), queue).unwrap();
        visualization.drain().unwrap();
        assert_eq!(visualization.processor().round(), 1);

        let (_sender, fresh) = event_channel();
        visualization.reset(&directory(), fresh).unwrap();
        assert_eq!(visualization.processor().round(), 0);
        assert!(visualization.processor().registry().is_empty());
        assert!(!visualization.is_done());
    }
}
