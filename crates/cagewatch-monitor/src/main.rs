//! Cagewatch monitor binary.
//!
//! Replays a recorded or live cage event stream through the event
//! processor, paces chart redraws with the frame scheduler, and writes the
//! final chart tables as JSON when the run ends.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `cagewatch-config.yaml` (or `CAGEWATCH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the event channel and spawn the replay producer
//! 4. Build the visualization from the participant directory
//! 5. Start the frame loop
//! 6. Stop the loop on Ctrl-C
//! 7. Wait for the run to end, then write the chart report

mod error;
mod replay;
mod surface;

use std::io::Write;
use std::path::Path;

use cagewatch_core::config::{LoggingConfig, MonitorConfig};
use cagewatch_core::queue::event_channel;
use cagewatch_core::visualization::{Visualization, VisualizationSession};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::MonitorError;
use crate::surface::{ChartReport, LogSurface};

/// Application entry point for the monitor.
///
/// # Errors
///
/// Returns an error if configuration, replay, event processing, or the
/// report export fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);

    info!(
        fps = config.display.fps,
        players = config.players.len(),
        verify_counts = config.processor.verify_counts,
        "cagewatch-monitor starting"
    );

    // 3. Event channel and replay producer.
    let (sender, queue) = event_channel();
    let replay_config = config.replay.clone();
    let producer = tokio::spawn(async move { replay::replay(&replay_config, sender).await });

    // 4. Visualization.
    let mut visualization = Visualization::init(&config.players, LogSurface::default(), queue)
        .map_err(MonitorError::from)?;
    visualization
        .processor_mut()
        .set_count_verification(config.processor.verify_counts);

    // 5. Frame loop.
    let mut session =
        VisualizationSession::new(visualization, config.display.fps).map_err(MonitorError::from)?;
    session.start().map_err(MonitorError::from)?;
    info!("Frame loop started");

    // 6. Ctrl-C stops the loop.
    let stop = session.stop_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            stop.stop();
        }
    });

    // 7. Wait for the run, then export.
    let run = session.wait().await;
    interrupt.abort();
    producer.abort();
    let replayed = match producer.await {
        Ok(result) => result.map(Some),
        Err(err) if err.is_cancelled() => Ok(None),
        Err(err) => Err(MonitorError::from(err)),
    };

    if let Some(visualization) = session.visualization() {
        let processor = visualization.processor();
        let report = ChartReport::from_processor(processor);
        write_report(&report, config.replay.output_path.as_deref())?;
        info!(
            round = processor.round(),
            processed = processor.processed(),
            live_mice = processor.registry().len(),
            redraws = visualization.surface().redraws(),
            replayed = ?replayed.as_ref().ok().copied().flatten(),
            finished = processor.is_finished(),
            "Run complete"
        );
    } else {
        warn!("Visualization lost, no report written");
    }

    let run = run.map_err(MonitorError::from)?;
    replayed?;
    info!(ticks = run.ticks, end = ?run.end, "Frame loop ended");
    Ok(())
}

/// Load configuration from the resolved config path.
///
/// If the file does not exist, returns the default configuration.
fn load_config() -> Result<MonitorConfig, MonitorError> {
    let config_path = MonitorConfig::resolve_path();
    if config_path.exists() {
        Ok(MonitorConfig::from_file(&config_path)?)
    } else {
        Ok(MonitorConfig::default())
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Write the report as pretty JSON to `path`, or to stdout when unset.
fn write_report(report: &ChartReport<'_>, path: Option<&Path>) -> Result<(), MonitorError> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            info!(path = %path.display(), "Chart report written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
