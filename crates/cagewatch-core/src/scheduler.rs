//! Fixed-rate frame loop with self-correcting pacing.
//!
//! The scheduler runs a [`Frame`] repeatedly on a spawned Tokio task. After
//! each frame it measures how long the frame's own work took and shortens
//! the next sleep by that much, so the loop holds its target rate even when
//! frames are uneven:
//!
//! ```text
//! cost  = (now - last_frame) - last_delay
//! delay = max(1 ms, period - cost)
//! ```
//!
//! # States
//!
//! - **idle**: no loop task exists. [`FrameScheduler::stop`] is a no-op.
//! - **running**: the loop task is alive. The first frame runs immediately
//!   after [`FrameScheduler::start`].
//!
//! A stop request (from [`FrameScheduler::stop`] or a [`StopHandle`], even
//! from inside a frame) cancels the pending sleep and guarantees no further
//! frame runs. The frame is handed back by [`FrameScheduler::join`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, trace};

/// Default frames per second.
pub const DEFAULT_FPS: u32 = 36;

/// Lower bound on the delay between frames.
pub const MIN_FRAME_DELAY: Duration = Duration::from_millis(1);

/// Errors raised by the frame scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The frame rate yields no usable frame period.
    #[error("invalid frame rate: {fps} fps")]
    InvalidFrameRate {
        /// The rejected rate.
        fps: u32,
    },

    /// A loop was started and has not been joined yet.
    #[error("frame loop is already running")]
    AlreadyRunning,

    /// There is no loop to join.
    #[error("frame loop was never started")]
    NotStarted,

    /// The loop task panicked or was aborted.
    #[error("frame loop task failed: {source}")]
    TaskFailed {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

/// What a frame asks the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Schedule another frame.
    Continue,
    /// There is nothing left to do; end the loop.
    Finished,
}

/// Work performed once per frame.
pub trait Frame: Send + 'static {
    /// Error that aborts the loop.
    type Error: std::error::Error + Send + 'static;

    /// Run one frame.
    fn frame(&mut self) -> Result<FrameStatus, Self::Error>;
}

/// Why a frame loop ended without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEnd {
    /// A stop was requested.
    Stopped,
    /// A frame reported [`FrameStatus::Finished`].
    Finished,
}

/// Everything a finished loop hands back.
#[derive(Debug)]
pub struct FrameLoopOutcome<F: Frame> {
    /// The frame, returned to the caller.
    pub frame: F,
    /// Number of frames that ran.
    pub ticks: u64,
    /// How the loop ended, or the error that aborted it.
    pub result: Result<LoopEnd, F::Error>,
}

/// Frame period for `fps` frames per second.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidFrameRate`] for 0 fps, or for a rate so
/// high the period rounds to zero.
pub fn frame_period(fps: u32) -> Result<Duration, SchedulerError> {
    Duration::from_secs(1)
        .checked_div(fps)
        .filter(|period| !period.is_zero())
        .ok_or(SchedulerError::InvalidFrameRate { fps })
}

/// Delay before the next frame given the target period and the processing
/// cost of the frame just run. Never below [`MIN_FRAME_DELAY`].
pub fn pacing_delay(period: Duration, cost: Duration) -> Duration {
    period.saturating_sub(cost).max(MIN_FRAME_DELAY)
}

// ---------------------------------------------------------------------------
// FramePacer
// ---------------------------------------------------------------------------

/// Clock state for one run: when the previous frame finished and how long
/// the loop then slept.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    last_frame: Option<Instant>,
    last_delay: Duration,
}

impl FramePacer {
    /// Create a pacer for the given frame period.
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            last_frame: None,
            last_delay: Duration::ZERO,
        }
    }

    /// Delay chosen after the most recent frame.
    pub const fn last_delay(&self) -> Duration {
        self.last_delay
    }

    /// Record a frame that began at `started` and ended at `now`, and return
    /// the delay before the next one.
    ///
    /// The first frame of a run has no predecessor, so its cost is its own
    /// duration. After that, cost is the time since the previous frame ended
    /// minus the delay that was slept.
    pub fn finish_frame(&mut self, started: Instant, now: Instant) -> Duration {
        let cost = self.last_frame.map_or_else(
            || now.saturating_duration_since(started),
            |last| {
                now.saturating_duration_since(last)
                    .saturating_sub(self.last_delay)
            },
        );
        let delay = pacing_delay(self.period, cost);
        self.last_frame = Some(now);
        self.last_delay = delay;
        delay
    }
}

// ---------------------------------------------------------------------------
// Stop control
// ---------------------------------------------------------------------------

/// State shared between the scheduler, its stop handles, and the loop task.
#[derive(Debug, Default)]
struct FrameControl {
    running: AtomicBool,
    stop_requested: AtomicBool,
    wake: Notify,
}

impl FrameControl {
    fn arm(&self) {
        self.stop_requested.store(false, Ordering::Release);
        self.running.store(true, Ordering::Release);
    }

    fn disarm(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    fn request_stop(&self) {
        if !self.is_running() {
            return;
        }
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Sleep for `delay`. Returns `true` if a stop was requested meanwhile.
    async fn sleep(&self, delay: Duration) -> bool {
        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                () = &mut timer => return self.is_stop_requested(),
                () = self.wake.notified() => {
                    if self.is_stop_requested() {
                        return true;
                    }
                }
            }
        }
    }
}

/// Clonable handle that stops a running loop. Safe to use from inside a
/// frame, and a no-op while the scheduler is idle.
#[derive(Debug, Clone)]
pub struct StopHandle {
    control: Arc<FrameControl>,
}

impl StopHandle {
    /// A handle not yet attached to any scheduler. Pass it to
    /// [`FrameScheduler::with_stop_handle`] to control that scheduler's
    /// loops, e.g. from a frame built before the scheduler exists.
    pub fn new() -> Self {
        Self {
            control: Arc::new(FrameControl::default()),
        }
    }

    /// Request a stop.
    pub fn stop(&self) {
        self.control.request_stop();
    }

    /// Whether the loop this handle controls is running.
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// FrameScheduler
// ---------------------------------------------------------------------------

/// Runs a [`Frame`] at a fixed rate on a Tokio task.
#[derive(Debug)]
pub struct FrameScheduler<F: Frame> {
    period: Duration,
    control: Arc<FrameControl>,
    task: Option<JoinHandle<FrameLoopOutcome<F>>>,
}

impl<F: Frame> FrameScheduler<F> {
    /// Create an idle scheduler targeting `fps` frames per second.
    pub fn new(fps: u32) -> Result<Self, SchedulerError> {
        Self::with_stop_handle(fps, &StopHandle::new())
    }

    /// Create an idle scheduler that `handle` (and its clones) can stop.
    pub fn with_stop_handle(fps: u32, handle: &StopHandle) -> Result<Self, SchedulerError> {
        Ok(Self {
            period: frame_period(fps)?,
            control: Arc::clone(&handle.control),
            task: None,
        })
    }

    /// Spawn the loop. The first frame runs without delay.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRunning`] if a previous loop has not
    /// been joined; `frame` is dropped in that case.
    pub fn start(&mut self, frame: F) -> Result<(), SchedulerError> {
        if self.task.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        self.control.arm();
        let control = Arc::clone(&self.control);
        self.task = Some(tokio::spawn(run_frames(frame, self.period, control)));
        Ok(())
    }

    /// Request a stop. No further frame runs after this returns. A no-op
    /// when idle.
    pub fn stop(&self) {
        self.control.request_stop();
    }

    /// Whether the loop task is alive.
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Whether a loop has been started and not yet joined.
    pub const fn is_started(&self) -> bool {
        self.task.is_some()
    }

    /// A handle that can stop this scheduler's loops.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            control: Arc::clone(&self.control),
        }
    }

    /// Wait for the loop to end and take back the frame. The scheduler is
    /// idle afterwards.
    pub async fn join(&mut self) -> Result<FrameLoopOutcome<F>, SchedulerError> {
        let task = self.task.take().ok_or(SchedulerError::NotStarted)?;
        let outcome = task.await;
        self.control.disarm();
        Ok(outcome?)
    }
}

/// The loop body run on the spawned task.
async fn run_frames<F: Frame>(
    mut frame: F,
    period: Duration,
    control: Arc<FrameControl>,
) -> FrameLoopOutcome<F> {
    let mut pacer = FramePacer::new(period);
    let mut ticks: u64 = 0;

    info!(period_us = period.as_micros(), "Frame loop starting");

    let result = loop {
        if control.is_stop_requested() {
            break Ok(LoopEnd::Stopped);
        }

        let started = Instant::now();
        let status = frame.frame();
        ticks = ticks.saturating_add(1);
        match status {
            Ok(FrameStatus::Continue) => {}
            Ok(FrameStatus::Finished) => break Ok(LoopEnd::Finished),
            Err(error) => break Err(error),
        }
        if control.is_stop_requested() {
            break Ok(LoopEnd::Stopped);
        }

        let delay = pacer.finish_frame(started, Instant::now());
        trace!(tick = ticks, delay_us = delay.as_micros(), "Next frame scheduled");
        if control.sleep(delay).await {
            break Ok(LoopEnd::Stopped);
        }
    };

    control.disarm();
    match &result {
        Ok(end) => info!(ticks, end = ?end, "Frame loop ended"),
        Err(error) => info!(ticks, %error, "Frame loop aborted"),
    }
    FrameLoopOutcome {
        frame,
        ticks,
        result,
    }
}
