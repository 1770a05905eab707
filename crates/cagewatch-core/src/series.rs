//! Chart time series built from registry snapshots.
//!
//! One [`SeriesTable`] exists per [`Metric`]. Every table is append-only and
//! each row is `[round, values...]` with the values in the table's fixed
//! column order. Rounds must be contiguous: once a table has a row for round
//! `r`, the next row must be for round `r + 1`.

use std::collections::BTreeMap;

use cagewatch_types::{Metric, Sex};
use serde::Serialize;

use crate::registry::{CountSnapshot, ParticipantOrder};

/// Header of the leading round column in every table.
pub const ROUND_COLUMN: &str = "Time";

/// Errors raised when appending chart rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    /// A row's width does not match the table's columns.
    #[error("{metric:?} row has {actual} values but the table has {expected} value columns")]
    ColumnMismatch {
        /// The table being appended to.
        metric: Metric,
        /// Number of value columns in the table.
        expected: usize,
        /// Number of values in the row.
        actual: usize,
    },

    /// A row's round does not directly follow the previous row.
    #[error("{metric:?} row for round {round} does not follow round {previous}")]
    NonContiguousRound {
        /// The table being appended to.
        metric: Metric,
        /// Round of the last stored row.
        previous: u64,
        /// Round of the rejected row.
        round: u64,
    },
}

/// One chart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesRow {
    /// The round this row describes.
    pub round: u64,
    /// Category values in column order.
    pub values: Vec<u32>,
}

impl SeriesRow {
    /// The row as a flat numeric array, round first, as chart libraries
    /// expect it.
    pub fn cells(&self) -> Vec<u64> {
        std::iter::once(self.round)
            .chain(self.values.iter().map(|value| u64::from(*value)))
            .collect()
    }
}

/// An append-only time series for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesTable {
    metric: Metric,
    title: String,
    columns: Vec<String>,
    rows: Vec<SeriesRow>,
}

impl SeriesTable {
    /// Create an empty table with a round column followed by
    /// `value_columns`.
    pub fn new(metric: Metric, value_columns: impl IntoIterator<Item = String>) -> Self {
        let columns = std::iter::once(ROUND_COLUMN.to_owned())
            .chain(value_columns)
            .collect();
        Self {
            metric,
            title: metric.title().to_owned(),
            columns,
            rows: Vec::new(),
        }
    }

    /// The metric this table tracks.
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Chart title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Column headers, round column first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in append order.
    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Round of the most recent row.
    pub fn last_round(&self) -> Option<u64> {
        self.rows.last().map(|row| row.round)
    }

    /// Check that `row` may be appended.
    fn check(&self, row: &SeriesRow) -> Result<(), SeriesError> {
        let expected = self.columns.len().saturating_sub(1);
        if row.values.len() != expected {
            return Err(SeriesError::ColumnMismatch {
                metric: self.metric,
                expected,
                actual: row.values.len(),
            });
        }
        if let Some(previous) = self.last_round() {
            if previous.checked_add(1) != Some(row.round) {
                return Err(SeriesError::NonContiguousRound {
                    metric: self.metric,
                    previous,
                    round: row.round,
                });
            }
        }
        Ok(())
    }
}

/// Converts count snapshots into one row per tracked metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesAggregator {
    tables: BTreeMap<Metric, SeriesTable>,
}

impl SeriesAggregator {
    /// Create empty tables whose owner columns follow `order`.
    pub fn new(order: &ParticipantOrder) -> Self {
        let mut aggregator = Self::default();
        aggregator.reset(order);
        aggregator
    }

    /// Drop every row and rebuild column headers for `order`.
    pub fn reset(&mut self, order: &ParticipantOrder) {
        self.tables = Metric::ALL
            .into_iter()
            .map(|metric| {
                let table = match metric.behavior() {
                    None => SeriesTable::new(
                        metric,
                        Sex::ALL.into_iter().map(|sex| sex.label().to_owned()),
                    ),
                    Some(_) => SeriesTable::new(
                        metric,
                        order.iter().map(|participant| participant.name.clone()),
                    ),
                };
                (metric, table)
            })
            .collect();
    }

    /// Append one row per metric for `round`.
    ///
    /// Every row is checked before any is appended, so a rejected emission
    /// leaves all four tables untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::ColumnMismatch`] if the snapshot width does not
    /// match the participant columns, or [`SeriesError::NonContiguousRound`]
    /// if `round` does not follow the last stored round.
    pub fn emit(&mut self, snapshot: &CountSnapshot, round: u64) -> Result<(), SeriesError> {
        let rows: Vec<(Metric, SeriesRow)> = Metric::ALL
            .into_iter()
            .map(|metric| {
                let row = SeriesRow {
                    round,
                    values: snapshot.values(metric),
                };
                (metric, row)
            })
            .collect();

        for (metric, row) in &rows {
            if let Some(table) = self.tables.get(metric) {
                table.check(row)?;
            }
        }
        for (metric, row) in rows {
            if let Some(table) = self.tables.get_mut(&metric) {
                table.rows.push(row);
            }
        }
        Ok(())
    }

    /// The table for one metric.
    pub fn table(&self, metric: Metric) -> Option<&SeriesTable> {
        self.tables.get(&metric)
    }

    /// All tables in chart order.
    pub fn tables(&self) -> impl Iterator<Item = &SeriesTable> {
        self.tables.values()
    }

    /// Number of rows in the population table (all tables share it).
    pub fn row_count(&self) -> usize {
        self.table(Metric::Population).map_or(0, SeriesTable::len)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cagewatch_types::{Participant, PlayerId};

    use super::*;
    use crate::registry::SexCounts;

    fn order() -> ParticipantOrder {
        ParticipantOrder::new(&[
            Participant {
                id: PlayerId(7),
                name: String::from("Zed"),
            },
            Participant {
                id: PlayerId(3),
                name: String::from("Amy"),
            },
        ])
        .unwrap()
    }

    fn snapshot(male: u32, owners: [u32; 2]) -> CountSnapshot {
        CountSnapshot {
            population: SexCounts {
                hermaphrodite: 0,
                male,
                female: 1,
            },
            pick_fight: owners.to_vec(),
            choose_mate: owners.to_vec(),
            mate_answer: owners.to_vec(),
        }
    }

    #[test]
    fn headers_follow_directory_order() {
        let aggregator = SeriesAggregator::new(&order());
        let pick_fight = aggregator.table(Metric::PickFight).unwrap();
        assert_eq!(pick_fight.columns(), ["Time", "Zed", "Amy"]);
        assert_eq!(pick_fight.title(), "Pick Fight");

        let population = aggregator.table(Metric::Population).unwrap();
        assert_eq!(
            population.columns(),
            ["Time", "Hermaphrodite", "Male", "Female"]
        );
    }

    #[test]
    fn emit_appends_one_row_per_metric() {
        let mut aggregator = SeriesAggregator::new(&order());
        aggregator.emit(&snapshot(2, [2, 1]), 0).unwrap();

        for table in aggregator.tables() {
            assert_eq!(table.len(), 1);
            assert_eq!(table.last_round(), Some(0));
        }
        let population = aggregator.table(Metric::Population).unwrap();
        assert_eq!(population.rows()[0].cells(), vec![0, 0, 2, 1]);
        let mate_answer = aggregator.table(Metric::MateAnswer).unwrap();
        assert_eq!(mate_answer.rows()[0].cells(), vec![0, 2, 1]);
    }

    #[test]
    fn repeated_round_is_rejected() {
        let mut aggregator = SeriesAggregator::new(&order());
        aggregator.emit(&snapshot(1, [1, 0]), 4).unwrap();
        let err = aggregator.emit(&snapshot(1, [1, 0]), 4);
        assert_eq!(
            err,
            Err(SeriesError::NonContiguousRound {
                metric: Metric::Population,
                previous: 4,
                round: 4,
            })
        );
        assert_eq!(aggregator.row_count(), 1);
    }

    #[test]
    fn narrow_snapshot_leaves_every_table_untouched() {
        let mut aggregator = SeriesAggregator::new(&order());
        let mut bad = snapshot(1, [1, 0]);
        bad.choose_mate = vec![1];
        let err = aggregator.emit(&bad, 0);
        assert!(matches!(
            err,
            Err(SeriesError::ColumnMismatch {
                metric: Metric::ChooseMate,
                expected: 2,
                actual: 1,
            })
        ));
        assert!(aggregator.tables().all(SeriesTable::is_empty));
    }

    #[test]
    fn reset_drops_rows() {
        let mut aggregator = SeriesAggregator::new(&order());
        aggregator.emit(&snapshot(1, [1, 0]), 0).unwrap();
        aggregator.reset(&order());
        assert_eq!(aggregator.row_count(), 0);
        aggregator.emit(&snapshot(1, [1, 0]), 0).unwrap();
        assert_eq!(aggregator.row_count(), 1);
    }
}
