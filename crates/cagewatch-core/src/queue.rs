//! Inbound event queue between the simulation engine and the processor.
//!
//! The engine side holds an [`EventSender`]; the processor side holds an
//! [`EventQueue`]. Events are delivered in send order and each is taken
//! exactly once. Taking never blocks: an empty queue simply yields `None`
//! until the next frame.

use cagewatch_types::CageEvent;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Errors raised while decoding a wire event.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not a JSON object.
    #[error("event is not valid JSON: {source}")]
    InvalidJson {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// The payload has no string `type` tag.
    #[error("event has no `type` tag")]
    MissingKind,

    /// The `type` tag names no known event kind.
    #[error("unrecognized event kind `{kind}`")]
    UnrecognizedEventKind {
        /// The tag as received.
        kind: String,
    },

    /// The tag is known but the fields do not match it.
    #[error("malformed {kind} event: {source}")]
    Malformed {
        /// The event kind.
        kind: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised when pushing onto the queue.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The event could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The consuming side has been dropped.
    #[error("event queue is closed")]
    Closed,
}

/// Decode one wire event.
///
/// The `type` tag is checked first so that an unknown kind is reported as
/// such rather than as a generic field error.
pub fn decode_event(json: &str) -> Result<CageEvent, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(DecodeError::MissingKind)?
        .to_owned();
    if !CageEvent::KINDS.contains(&kind.as_str()) {
        return Err(DecodeError::UnrecognizedEventKind { kind });
    }
    serde_json::from_value(value).map_err(|source| DecodeError::Malformed { kind, source })
}

/// Create a connected sender/queue pair.
pub fn event_channel() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventSender { tx },
        EventQueue {
            rx,
            disconnected: false,
        },
    )
}

/// Producer half of the event queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<CageEvent>,
}

impl EventSender {
    /// Append an event to the queue.
    pub fn send(&self, event: CageEvent) -> Result<(), QueueError> {
        self.tx.send(event).map_err(|_closed| QueueError::Closed)
    }

    /// Decode a wire event and append it.
    pub fn send_json(&self, json: &str) -> Result<(), QueueError> {
        let event = decode_event(json)?;
        self.send(event)
    }

    /// Whether the consuming side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of the event queue.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<CageEvent>,
    disconnected: bool,
}

impl EventQueue {
    /// A queue pre-loaded with `events` whose producer has already hung up.
    pub fn from_events(events: impl IntoIterator<Item = CageEvent>) -> Self {
        let (sender, queue) = event_channel();
        for event in events {
            // `queue` is still held here, so the receiver is open and the send succeeds.
            let _ = sender.send(event);
        }
        queue
    }

    /// Take the oldest pending event without waiting.
    pub fn next_event(&mut self) -> Option<CageEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    /// Whether every producer has hung up and every event has been taken.
    ///
    /// Only becomes true after a [`next_event`](Self::next_event) call
    /// observes the disconnect.
    pub const fn is_closed(&self) -> bool {
        self.disconnected
    }
}
