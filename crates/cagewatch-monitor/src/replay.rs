//! Event stream replay.
//!
//! Reads one JSON event per line from a file or standard input and pushes
//! it onto the event queue, optionally pausing between events to mimic a
//! live engine. Blank lines and lines starting with `#` are skipped.

use std::time::Duration;

use cagewatch_core::config::ReplayConfig;
use cagewatch_core::queue::EventSender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::error::MonitorError;

/// Replay the configured event source into `sender`. Returns the number of
/// events sent.
///
/// The sender is dropped on return, which lets the consumer see the end of
/// the stream.
pub async fn replay(config: &ReplayConfig, sender: EventSender) -> Result<usize, MonitorError> {
    let interval = Duration::from_millis(config.event_interval_ms);
    let sent = match &config.events_path {
        Some(path) => {
            info!(path = %path.display(), "Replaying events from file");
            let file = tokio::fs::File::open(path).await?;
            replay_lines(BufReader::new(file), &sender, interval).await?
        }
        None => {
            info!("Replaying events from standard input");
            replay_lines(BufReader::new(tokio::io::stdin()), &sender, interval).await?
        }
    };
    drop(sender);
    info!(events = sent, "Event stream exhausted");
    Ok(sent)
}

/// Send every event line from `reader`.
///
/// Stops early, without error, if the consumer has gone away.
pub async fn replay_lines<R>(
    reader: R,
    sender: &EventSender,
    interval: Duration,
) -> Result<usize, MonitorError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_number: usize = 0;
    let mut sent: usize = 0;

    while let Some(line) = lines.next_line().await? {
        line_number = line_number.saturating_add(1);
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if sender.is_closed() {
            debug!(line = line_number, "Consumer gone, ending replay");
            break;
        }
        sender
            .send_json(trimmed)
            .map_err(|source| MonitorError::EventStream {
                line: line_number,
                source,
            })?;
        sent = sent.saturating_add(1);
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(sent)
}
