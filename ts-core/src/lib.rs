//! Time-indexed series store backing every chart.
//!
//! A [`SeriesStore`] owns one [`TimeIndex`] (ascending timestamps in a
//! fixed-capacity ring) and any number of named [`FieldColumn`]s aligned to it
//! by position. Lookups are binary searches over the logically sorted ring;
//! rows outside the stored range are extrapolated with the store's
//! [`Cadence`]. [`CalendarView`] re-numbers rows as if every cadence tick
//! existed, without copying the index.
//!
//! Once the ring is full the oldest row is evicted on every append, so memory
//! stays bounded however much history streams through.

mod cadence;
mod calendar;
mod column;
mod config;
mod error;
mod record;
mod ring;
mod store;
mod time_index;

pub use cadence::{Cadence, CadenceUnit};
pub use calendar::{AxisMode, CalendarView, RowAxis};
pub use column::{Column, ColumnKind, ColumnMut, FieldColumn};
pub use config::{StoreConfig, CADENCE_ENV, CAPACITY_ENV, DEFAULT_CAPACITY};
pub use error::{Result, SeriesError};
pub use record::{is_ascending, Candle, HasTimestamp, Row, SeriesRecord};
pub use ring::{Iter, Pushed, RingList};
pub use store::{BatchReport, SeriesSnapshot, SeriesStore, UpsertOutcome};
pub use time_index::TimeIndex;

/// Milliseconds since Unix epoch.
pub type Timestamp = i64;

/// Number of milliseconds in common units.
pub const MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
