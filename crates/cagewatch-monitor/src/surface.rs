//! Log-backed render surface and the final chart report.

use cagewatch_core::processor::{EventProcessor, RunOutcome};
use cagewatch_core::series::{SeriesAggregator, SeriesTable};
use cagewatch_core::visualization::RenderSurface;
use serde::Serialize;
use tracing::debug;

/// A render surface that logs the newest row of every chart whenever rows
/// have been appended since the previous redraw.
#[derive(Debug, Default)]
pub struct LogSurface {
    redraws: u64,
    drawn_rows: usize,
}

impl LogSurface {
    /// Number of redraws so far.
    pub const fn redraws(&self) -> u64 {
        self.redraws
    }
}

impl RenderSurface for LogSurface {
    fn redraw(&mut self, charts: &SeriesAggregator) {
        self.redraws = self.redraws.saturating_add(1);
        let rows = charts.row_count();
        if rows == self.drawn_rows {
            return;
        }
        self.drawn_rows = rows;
        for table in charts.tables() {
            if let Some(row) = table.rows().last() {
                debug!(
                    chart = table.title(),
                    round = row.round,
                    values = ?row.values,
                    "Chart updated"
                );
            }
        }
    }
}

/// Final state of a run, as written to the output file.
#[derive(Debug, Serialize)]
pub struct ChartReport<'a> {
    /// Last round reached.
    pub round: u64,
    /// Mice still alive at the end.
    pub live_mice: usize,
    /// The `END_GAME` details, if the game ended.
    pub outcome: Option<&'a RunOutcome>,
    /// Every chart table in chart order.
    pub charts: Vec<&'a SeriesTable>,
}

impl<'a> ChartReport<'a> {
    /// Capture the report from a processor.
    pub fn from_processor(processor: &'a EventProcessor) -> Self {
        Self {
            round: processor.round(),
            live_mice: processor.registry().len(),
            outcome: processor.outcome(),
            charts: processor.series().tables().collect(),
        }
    }
}
