use serde::{Deserialize, Serialize};

use crate::error::{Result, SeriesError};
use crate::ring::RingList;
use crate::time_index::TimeIndex;
use crate::Timestamp;

/// Informational tag describing how a column's values combine. The store
/// itself treats every kind the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Open,
    High,
    Low,
    Close,
    Volume,
    Accumulate,
    #[default]
    Plain,
}

impl ColumnKind {
    /// Kind implied by a conventional column name ("close", "volume", ...).
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "open" | "o" => ColumnKind::Open,
            "high" | "h" => ColumnKind::High,
            "low" | "l" => ColumnKind::Low,
            "close" | "c" => ColumnKind::Close,
            "volume" | "vol" | "v" => ColumnKind::Volume,
            _ => ColumnKind::Plain,
        }
    }
}

/// Values aligned 1:1 by position with a [`TimeIndex`]. `None` marks a
/// timestamp with no observation in this column.
#[derive(Debug, Clone)]
pub struct FieldColumn<V> {
    kind: ColumnKind,
    values: RingList<Option<V>>,
}

impl<V> FieldColumn<V> {
    pub fn new(kind: ColumnKind, capacity: usize) -> Result<Self> {
        Ok(Self {
            kind,
            values: RingList::new(capacity)?,
        })
    }

    /// All-absent column as long as `index`, for a column first referenced
    /// after rows already exist.
    pub(crate) fn aligned(kind: ColumnKind, index: &TimeIndex) -> Self {
        let mut column = Self {
            kind,
            values: index.aligned_ring(),
        };
        for _ in 0..index.len() {
            column.append_absent();
        }
        column
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ColumnKind) {
        self.kind = kind;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_indexed(&self, index: &TimeIndex, t: Timestamp) -> bool {
        index.position_of_time(t).is_some()
    }

    /// Value at `t`. `None` both when `t` is not indexed and when no value
    /// was written there; use [`is_indexed`](Self::is_indexed) to tell them apart.
    pub fn get_by_time(&self, index: &TimeIndex, t: Timestamp) -> Option<&V> {
        let position = index.position_of_time(t)?;
        self.values.get(position).ok()?.as_ref()
    }

    pub fn set_by_time(&mut self, index: &TimeIndex, t: Timestamp, value: V) -> Result<()> {
        let position = index
            .position_of_time(t)
            .ok_or(SeriesError::TimeNotIndexed(t))?;
        self.set_by_position(position, value)
    }

    pub fn get_by_position(&self, position: usize) -> Result<Option<&V>> {
        Ok(self.values.get(position)?.as_ref())
    }

    pub fn set_by_position(&mut self, position: usize, value: V) -> Result<()> {
        self.values.set(position, Some(value))
    }

    /// Values in logical order, `None` where absent.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = Option<&V>> + '_ {
        self.values.iter().map(Option::as_ref)
    }

    pub(crate) fn append_absent(&mut self) -> usize {
        self.values.append(None)
    }

    pub(crate) fn insert_absent_at(&mut self, position: usize) -> Result<Option<usize>> {
        self.values.insert_at(position, None)
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}

impl<V: Clone> FieldColumn<V> {
    pub fn to_vec(&self) -> Vec<Option<V>> {
        self.values.to_vec()
    }

    pub fn slice(&self, from: usize, len: usize) -> Result<Vec<Option<V>>> {
        self.values.slice(from, len)
    }
}

/// Read handle pairing a column with the index it is aligned to.
#[derive(Debug)]
pub struct Column<'a, V> {
    index: &'a TimeIndex,
    column: &'a FieldColumn<V>,
}

impl<V> Clone for Column<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Column<'_, V> {}

impl<'a, V> Column<'a, V> {
    pub(crate) fn new(index: &'a TimeIndex, column: &'a FieldColumn<V>) -> Self {
        Self { index, column }
    }

    pub fn field(&self) -> &'a FieldColumn<V> {
        self.column
    }

    pub fn kind(&self) -> ColumnKind {
        self.column.kind()
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    pub fn is_indexed(&self, t: Timestamp) -> bool {
        self.column.is_indexed(self.index, t)
    }

    pub fn get_by_time(&self, t: Timestamp) -> Option<&'a V> {
        self.column.get_by_time(self.index, t)
    }

    pub fn get_by_position(&self, position: usize) -> Result<Option<&'a V>> {
        self.column.get_by_position(position)
    }

    /// `(timestamp, value)` pairs in logical order.
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, Option<&'a V>)> + 'a {
        self.index.iter().zip(self.column.values())
    }
}

/// Write handle pairing a column with the index it is aligned to. Writes
/// never change the column's length.
#[derive(Debug)]
pub struct ColumnMut<'a, V> {
    index: &'a TimeIndex,
    column: &'a mut FieldColumn<V>,
}

impl<'a, V> ColumnMut<'a, V> {
    pub(crate) fn new(index: &'a TimeIndex, column: &'a mut FieldColumn<V>) -> Self {
        Self { index, column }
    }

    pub fn as_column(&self) -> Column<'_, V> {
        Column::new(self.index, self.column)
    }

    pub fn kind(&self) -> ColumnKind {
        self.column.kind()
    }

    pub fn set_kind(&mut self, kind: ColumnKind) {
        self.column.set_kind(kind);
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    pub fn is_indexed(&self, t: Timestamp) -> bool {
        self.column.is_indexed(self.index, t)
    }

    pub fn get_by_time(&self, t: Timestamp) -> Option<&V> {
        self.column.get_by_time(self.index, t)
    }

    pub fn set_by_time(&mut self, t: Timestamp, value: V) -> Result<()> {
        self.column.set_by_time(self.index, t, value)
    }

    pub fn get_by_position(&self, position: usize) -> Result<Option<&V>> {
        self.column.get_by_position(position)
    }

    pub fn set_by_position(&mut self, position: usize, value: V) -> Result<()> {
        self.column.set_by_position(position, value)
    }
}
