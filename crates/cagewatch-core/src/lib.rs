//! Event processing, chart aggregation, and frame pacing for Cagewatch.
//!
//! This crate turns the simulation engine's cage event stream into live
//! population statistics and chart time series, and drives the fixed-rate
//! loop that redraws the charts and drains new events.
//!
//! # Modules
//!
//! - [`registry`] -- Live mouse table and per-category running counts.
//! - [`series`] -- One append-only chart table per tracked metric.
//! - [`queue`] -- Inbound event channel and wire decoding.
//! - [`narrative`] -- One human-readable log line per event.
//! - [`processor`] -- The event state machine.
//! - [`scheduler`] -- [`Frame`] trait and the self-pacing frame loop.
//! - [`visualization`] -- Render-then-drain frame and its lifecycle
//!   controls.
//! - [`config`] -- Configuration loading from `cagewatch-config.yaml`.
//!
//! [`Frame`]: scheduler::Frame

pub mod config;
pub mod narrative;
pub mod processor;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod series;
pub mod visualization;
