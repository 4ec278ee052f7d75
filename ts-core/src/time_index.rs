use std::cmp::Ordering;

use crate::cadence::Cadence;
use crate::calendar::{CalendarView, RowAxis};
use crate::error::Result;
use crate::ring::{Iter, RingList};
use crate::Timestamp;

/// How [`TimeIndex::register`] placed a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registration {
    /// Already present at this position.
    Existing(usize),
    /// Appended at the logical end, possibly evicting the oldest timestamp.
    Appended {
        position: usize,
        evicted: Option<Timestamp>,
    },
    /// Inserted in the middle. `evicted` is set when the ring was full.
    Inserted {
        position: usize,
        evicted: Option<Timestamp>,
    },
    /// Older than everything in a full ring, so never stored.
    Dropped,
}

/// Strictly ascending timestamps in a fixed-capacity ring, with binary-search
/// lookups and cadence-based extrapolation outside the stored range.
///
/// Only the owning [`SeriesStore`](crate::SeriesStore) grows the index, so
/// every column stays aligned with it.
#[derive(Debug, Clone)]
pub struct TimeIndex {
    times: RingList<Timestamp>,
    cadence: Cadence,
    first_occurred: Option<Timestamp>,
    last_occurred: Option<Timestamp>,
}

impl TimeIndex {
    pub fn new(cadence: Cadence, capacity: usize) -> Result<Self> {
        Ok(Self {
            times: RingList::new(capacity)?,
            cadence,
            first_occurred: None,
            last_occurred: None,
        })
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn capacity(&self) -> usize {
        self.times.capacity()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Earliest stored timestamp.
    pub fn first_time(&self) -> Option<Timestamp> {
        self.first_occurred
    }

    /// Latest stored timestamp.
    pub fn last_time(&self) -> Option<Timestamp> {
        self.last_occurred
    }

    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    pub fn get(&self, position: usize) -> Result<Timestamp> {
        self.times.get(position).copied()
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        self.position_of_time(t).is_some()
    }

    pub fn iter(&self) -> std::iter::Copied<Iter<'_, Timestamp>> {
        self.times.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Timestamp> {
        self.times.to_vec()
    }

    pub fn slice(&self, from: usize, len: usize) -> Result<Vec<Timestamp>> {
        self.times.slice(from, len)
    }

    pub(crate) fn aligned_ring<U>(&self) -> RingList<U> {
        self.times.empty_like()
    }

    /// Zero-copy calendar lens over this index.
    pub fn calendar(&self) -> CalendarView<'_> {
        CalendarView::new(self)
    }

    fn at(&self, position: usize) -> Timestamp {
        // callers stay within [0, len)
        self.times.get(position).copied().unwrap_or_default()
    }

    /// First position whose time is `>= t` (`len` when none).
    fn lower_bound(&self, t: Timestamp) -> usize {
        self.times.partition_point(|&x| x < t)
    }

    /// Position of `t`, or `None` when `t` is not stored.
    pub fn position_of_time(&self, t: Timestamp) -> Option<usize> {
        let pos = self.lower_bound(t);
        (pos < self.len() && self.at(pos) == t).then_some(pos)
    }

    /// Nearest position whose time is `>= t`.
    pub fn position_or_next_of_time(&self, t: Timestamp) -> Option<usize> {
        let pos = self.lower_bound(t);
        (pos < self.len()).then_some(pos)
    }

    /// Nearest position whose time is `<= t`.
    pub fn position_or_prev_of_time(&self, t: Timestamp) -> Option<usize> {
        let pos = self.times.partition_point(|&x| x <= t);
        pos.checked_sub(1)
    }

    /// Position whose time is closest to `t`; ties go to the lower position.
    pub fn nearest_position(&self, t: Timestamp) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let next = self.lower_bound(t);
        if next == 0 {
            return Some(0);
        }
        if next == self.len() {
            return Some(next - 1);
        }
        let prev = next - 1;
        let below = t.abs_diff(self.at(prev));
        let above = self.at(next).abs_diff(t);
        match below.cmp(&above) {
            Ordering::Greater => Some(next),
            Ordering::Less | Ordering::Equal => Some(prev),
        }
    }

    /// Row of `t` in the occurred view: the stored (or nearest) position inside
    /// the stored range, extrapolated by cadence steps before the first or
    /// after the last stored timestamp. `None` only when the index is empty.
    pub fn row_of_time(&self, t: Timestamp) -> Option<i64> {
        let first = self.first_occurred?;
        let last = self.last_occurred?;
        if t <= first {
            return Some(self.cadence.timeframes_between(first, t));
        }
        if t >= last {
            let last_index = self.len() as i64 - 1;
            return Some(last_index + self.cadence.timeframes_between(last, t));
        }
        self.nearest_position(t).map(|p| p as i64)
    }

    /// Inverse of [`row_of_time`](Self::row_of_time). `None` only when the index is empty.
    pub fn time_of_row(&self, row: i64) -> Option<Timestamp> {
        let first = self.first_occurred?;
        let last = self.last_occurred?;
        let last_index = self.len() as i64 - 1;
        if row < 0 {
            Some(self.cadence.advance(first, row))
        } else if row > last_index {
            Some(self.cadence.advance(last, row - last_index))
        } else {
            Some(self.at(row as usize))
        }
    }

    /// Place `t` in sorted order: append when `t` is past the last stored
    /// timestamp, otherwise binary-search the insertion point.
    pub(crate) fn register(&mut self, t: Timestamp) -> Registration {
        let registration = match self.last_occurred {
            Some(last) if t == last => Registration::Existing(self.len() - 1),
            Some(last) if t < last => {
                let pos = self.lower_bound(t);
                if self.at(pos) == t {
                    Registration::Existing(pos)
                } else {
                    let evicted = if self.times.is_full() {
                        self.times.first().copied()
                    } else {
                        None
                    };
                    match self.times.insert_at(pos, t) {
                        Ok(Some(position)) => {
                            tracing::trace!(t, position, "back-filled timestamp");
                            Registration::Inserted { position, evicted }
                        }
                        _ => Registration::Dropped,
                    }
                }
            }
            _ => {
                let pushed = self.times.push_back(t);
                Registration::Appended {
                    position: pushed.position,
                    evicted: pushed.evicted,
                }
            }
        };
        self.refresh_bounds();
        registration
    }

    /// Drop `position` and everything after it.
    pub(crate) fn truncate(&mut self, position: usize) {
        self.times.truncate(position);
        self.refresh_bounds();
    }

    pub(crate) fn clear(&mut self) {
        self.times.clear();
        self.refresh_bounds();
    }

    fn refresh_bounds(&mut self) {
        self.first_occurred = self.times.first().copied();
        self.last_occurred = self.times.last().copied();
    }
}

impl RowAxis for TimeIndex {
    fn row_of_time(&self, t: Timestamp) -> Option<i64> {
        TimeIndex::row_of_time(self, t)
    }

    fn time_of_row(&self, row: i64) -> Option<Timestamp> {
        TimeIndex::time_of_row(self, row)
    }
}
