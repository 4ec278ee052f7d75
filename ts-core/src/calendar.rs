use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::time_index::TimeIndex;
use crate::{Cadence, Timestamp};

/// Translation between chart rows and timestamps.
pub trait RowAxis {
    fn row_of_time(&self, t: Timestamp) -> Option<i64>;
    fn time_of_row(&self, row: i64) -> Option<Timestamp>;
}

/// Which row numbering the view layer displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// One row per stored timestamp.
    #[default]
    Occurred,
    /// One row per cadence tick since the first stored timestamp, gaps included.
    Calendar,
}

/// Read-only lens over a [`TimeIndex`] that numbers rows as if every cadence
/// tick since the first stored timestamp existed.
///
/// Holds a borrow, never a copy: any view created after a mutation of the
/// backing index sees that mutation, and the borrow checker keeps the view
/// from outliving the index.
#[derive(Debug, Clone, Copy)]
pub struct CalendarView<'a> {
    index: &'a TimeIndex,
}

impl<'a> CalendarView<'a> {
    pub(crate) fn new(index: &'a TimeIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a TimeIndex {
        self.index
    }

    pub fn cadence(&self) -> Cadence {
        self.index.cadence()
    }

    pub fn row_of_time(&self, t: Timestamp) -> Option<i64> {
        let first = self.index.first_time()?;
        Some(self.index.cadence().timeframes_between(first, t))
    }

    pub fn time_of_row(&self, row: i64) -> Option<Timestamp> {
        let first = self.index.first_time()?;
        Some(self.index.cadence().advance(first, row))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn first_time(&self) -> Option<Timestamp> {
        self.index.first_time()
    }

    pub fn last_time(&self) -> Option<Timestamp> {
        self.index.last_time()
    }

    pub fn get(&self, position: usize) -> Result<Timestamp> {
        self.index.get(position)
    }

    pub fn position_of_time(&self, t: Timestamp) -> Option<usize> {
        self.index.position_of_time(t)
    }

    pub fn position_or_next_of_time(&self, t: Timestamp) -> Option<usize> {
        self.index.position_or_next_of_time(t)
    }

    pub fn position_or_prev_of_time(&self, t: Timestamp) -> Option<usize> {
        self.index.position_or_prev_of_time(t)
    }

    pub fn nearest_position(&self, t: Timestamp) -> Option<usize> {
        self.index.nearest_position(t)
    }
}

impl RowAxis for CalendarView<'_> {
    fn row_of_time(&self, t: Timestamp) -> Option<i64> {
        CalendarView::row_of_time(self, t)
    }

    fn time_of_row(&self, row: i64) -> Option<Timestamp> {
        CalendarView::time_of_row(self, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DAY_MS;

    const JAN_1_2024: Timestamp = 1_704_067_200_000;

    fn mk_index(days: &[i64]) -> TimeIndex {
        let mut index = TimeIndex::new(Cadence::Days(1), 16).unwrap();
        for &d in days {
            index.register(JAN_1_2024 + d * DAY_MS);
        }
        index
    }

    #[test]
    fn counts_gaps_as_rows() {
        let index = mk_index(&[0, 1, 3]);
        let jan_4 = JAN_1_2024 + 3 * DAY_MS;
        assert_eq!(index.row_of_time(jan_4), Some(2));
        assert_eq!(index.calendar().row_of_time(jan_4), Some(3));
        assert_eq!(index.calendar().time_of_row(2), Some(JAN_1_2024 + 2 * DAY_MS));
        assert_eq!(index.calendar().row_of_time(JAN_1_2024 - DAY_MS), Some(-1));
    }

    #[test]
    fn storage_queries_match_the_index() {
        let index = mk_index(&[0, 1, 3, 7, 8]);
        let view = index.calendar();
        assert_eq!(view.len(), index.len());
        for t in index.iter() {
            assert_eq!(view.position_of_time(t), index.position_of_time(t));
            assert_eq!(view.nearest_position(t), index.nearest_position(t));
            assert_eq!(
                view.position_or_next_of_time(t + 1),
                index.position_or_next_of_time(t + 1)
            );
            assert_eq!(
                view.position_or_prev_of_time(t - 1),
                index.position_or_prev_of_time(t - 1)
            );
        }
    }

    #[test]
    fn calendar_rows_round_trip() {
        let index = mk_index(&[0, 5, 6]);
        let view = index.calendar();
        for row in -20..20 {
            let t = view.time_of_row(row).unwrap();
            assert_eq!(view.row_of_time(t), Some(row));
        }
    }

    #[test]
    fn reflects_mutations_of_the_backing_index() {
        let mut index = mk_index(&[2, 3]);
        assert_eq!(index.calendar().row_of_time(JAN_1_2024 + 3 * DAY_MS), Some(1));
        index.register(JAN_1_2024);
        assert_eq!(index.calendar().first_time(), Some(JAN_1_2024));
        assert_eq!(index.calendar().row_of_time(JAN_1_2024 + 3 * DAY_MS), Some(3));
        index.clear();
        assert_eq!(index.calendar().row_of_time(JAN_1_2024), None);
    }

    #[test]
    fn row_axis_dispatch() {
        let index = mk_index(&[0, 4]);
        let view = index.calendar();
        let axes: [&dyn RowAxis; 2] = [&index, &view];
        let t = JAN_1_2024 + 4 * DAY_MS;
        let rows: Vec<_> = axes.iter().map(|axis| axis.row_of_time(t)).collect();
        assert_eq!(rows, vec![Some(1), Some(4)]);
    }
}
