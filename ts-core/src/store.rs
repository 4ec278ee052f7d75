use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{AxisMode, CalendarView};
use crate::column::{Column, ColumnKind, ColumnMut, FieldColumn};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::record::{is_ascending, SeriesRecord};
use crate::time_index::{Registration, TimeIndex};
use crate::{Cadence, Timestamp};

/// What [`SeriesStore::upsert`] did with a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New timestamp past the last one. `evicted` is the timestamp dropped
    /// from the front when the ring was full.
    Appended {
        position: usize,
        evicted: Option<Timestamp>,
    },
    /// New timestamp back-filled before the last one.
    Inserted {
        position: usize,
        evicted: Option<Timestamp>,
    },
    /// Timestamp already present; the given columns were overwritten.
    Updated { position: usize },
    /// Older than everything in a full store; nothing was written.
    Dropped,
}

impl UpsertOutcome {
    pub fn position(&self) -> Option<usize> {
        match *self {
            UpsertOutcome::Appended { position, .. }
            | UpsertOutcome::Inserted { position, .. }
            | UpsertOutcome::Updated { position } => Some(position),
            UpsertOutcome::Dropped => None,
        }
    }

    pub fn evicted(&self) -> Option<Timestamp> {
        match *self {
            UpsertOutcome::Appended { evicted, .. } | UpsertOutcome::Inserted { evicted, .. } => {
                evicted
            }
            _ => None,
        }
    }
}

/// Counts of what a batch upsert did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub appended: usize,
    pub inserted: usize,
    pub updated: usize,
    pub dropped: usize,
    pub evicted: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Appended { .. } => self.appended += 1,
            UpsertOutcome::Inserted { .. } => self.inserted += 1,
            UpsertOutcome::Updated { .. } => self.updated += 1,
            UpsertOutcome::Dropped => self.dropped += 1,
        }
        if outcome.evicted().is_some() {
            self.evicted += 1;
        }
    }
}

/// Owned, logically ordered copy of a store range, for readers that must not
/// hold the store itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot<V> {
    pub cadence: Cadence,
    pub times: Vec<Timestamp>,
    pub columns: BTreeMap<String, Vec<Option<V>>>,
}

impl<V> SeriesSnapshot<V> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Time index plus named value columns, all kept the same length.
///
/// The store is the only writer of its index. Registering a new timestamp
/// grows every column by an absent slot at the same position before any value
/// is written, and dropping rows (ring overflow or [`clear_from`]) shrinks
/// every column the same way.
///
/// [`clear_from`]: SeriesStore::clear_from
#[derive(Debug, Clone)]
pub struct SeriesStore<V = f64> {
    index: TimeIndex,
    columns: BTreeMap<String, FieldColumn<V>>,
}

impl<V> SeriesStore<V> {
    pub fn new(cadence: Cadence, capacity: usize) -> Result<Self> {
        Ok(Self {
            index: TimeIndex::new(cadence, capacity)?,
            columns: BTreeMap::new(),
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(config.cadence, config.capacity)
    }

    pub fn cadence(&self) -> Cadence {
        self.index.cadence()
    }

    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Number of stored timestamps.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn calendar(&self) -> CalendarView<'_> {
        self.index.calendar()
    }

    pub fn is_indexed(&self, t: Timestamp) -> bool {
        self.index.contains(t)
    }

    pub fn row_of_time(&self, mode: AxisMode, t: Timestamp) -> Option<i64> {
        match mode {
            AxisMode::Occurred => self.index.row_of_time(t),
            AxisMode::Calendar => self.calendar().row_of_time(t),
        }
    }

    pub fn time_of_row(&self, mode: AxisMode, row: i64) -> Option<Timestamp> {
        match mode {
            AxisMode::Occurred => self.index.time_of_row(row),
            AxisMode::Calendar => self.calendar().time_of_row(row),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Existing column, never created.
    pub fn column(&self, name: &str) -> Option<Column<'_, V>> {
        self.columns
            .get(name)
            .map(|column| Column::new(&self.index, column))
    }

    /// Column `name`, created all-absent and as long as the index on first use.
    pub fn column_mut(&mut self, name: &str) -> ColumnMut<'_, V> {
        let Self { index, columns } = self;
        let column = columns.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(column = name, rows = index.len(), "created column");
            FieldColumn::aligned(ColumnKind::from_name(name), index)
        });
        ColumnMut::new(index, column)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<FieldColumn<V>> {
        self.columns.remove(name)
    }

    /// Value of column `name` at `t`.
    pub fn get(&self, name: &str, t: Timestamp) -> Option<&V> {
        self.columns.get(name)?.get_by_time(&self.index, t)
    }

    /// Register `t` if needed and write `values` at its position. Columns not
    /// named in `values` get an absent slot for a new timestamp and are left
    /// untouched for an existing one.
    pub fn upsert<I, K>(&mut self, t: Timestamp, values: I) -> UpsertOutcome
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
    {
        let outcome = match self.index.register(t) {
            Registration::Existing(position) => UpsertOutcome::Updated { position },
            Registration::Appended { position, evicted } => {
                for column in self.columns.values_mut() {
                    let landed = column.append_absent();
                    debug_assert_eq!(landed, position);
                }
                UpsertOutcome::Appended { position, evicted }
            }
            Registration::Inserted { position, evicted } => {
                // a full ring lands one slot before the requested position
                let at = if evicted.is_some() { position + 1 } else { position };
                for column in self.columns.values_mut() {
                    let landed = column.insert_absent_at(at);
                    debug_assert_eq!(landed, Ok(Some(position)));
                }
                UpsertOutcome::Inserted { position, evicted }
            }
            Registration::Dropped => {
                tracing::warn!(
                    t,
                    capacity = self.capacity(),
                    "store full, dropped back-filled timestamp"
                );
                return UpsertOutcome::Dropped;
            }
        };
        if let Some(position) = outcome.position() {
            for (name, value) in values {
                let written = self.column_mut(name.as_ref()).set_by_position(position, value);
                debug_assert!(written.is_ok(), "column out of step with index");
            }
        }
        outcome
    }

    /// Upsert every record, walking the batch in ascending time order whatever
    /// its direction so that rows are appended rather than shifted in.
    pub fn upsert_all<R>(&mut self, records: &[R]) -> BatchReport
    where
        R: SeriesRecord<V>,
    {
        let mut report = BatchReport::default();
        if is_ascending(records) {
            for record in records {
                report.record(self.upsert(record.ts(), record.fields()));
            }
        } else {
            for record in records.iter().rev() {
                report.record(self.upsert(record.ts(), record.fields()));
            }
        }
        tracing::debug!(
            records = records.len(),
            appended = report.appended,
            inserted = report.inserted,
            updated = report.updated,
            dropped = report.dropped,
            evicted = report.evicted,
            "applied batch"
        );
        report
    }

    /// Remove the first row at or after `t` and every row after it, from the
    /// index and every column. Returns the number of rows removed.
    pub fn clear_from(&mut self, t: Timestamp) -> usize {
        let Some(position) = self.index.position_or_next_of_time(t) else {
            return 0;
        };
        let removed = self.index.len() - position;
        self.index.truncate(position);
        for column in self.columns.values_mut() {
            column.truncate(position);
        }
        tracing::debug!(t, removed, remaining = self.index.len(), "cleared rows");
        removed
    }

    /// Drop every row; columns stay registered.
    pub fn reset(&mut self) {
        self.index.clear();
        for column in self.columns.values_mut() {
            column.clear();
        }
    }
}

impl<V: Clone> SeriesStore<V> {
    /// Copy of `len` rows starting at position `from`.
    pub fn snapshot(&self, from: usize, len: usize) -> Result<SeriesSnapshot<V>> {
        let times = self.index.slice(from, len)?;
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| Ok((name.clone(), column.slice(from, len)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(SeriesSnapshot {
            cadence: self.cadence(),
            times,
            columns,
        })
    }

    pub fn snapshot_all(&self) -> SeriesSnapshot<V> {
        SeriesSnapshot {
            cadence: self.cadence(),
            times: self.index.to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.to_vec()))
                .collect(),
        }
    }
}
