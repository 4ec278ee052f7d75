use serde::{Deserialize, Serialize};
use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;
use thiserror::Error;
use ts_core::{
    BatchReport, Cadence, Candle, SeriesError, SeriesRecord, SeriesStore, StoreConfig, Timestamp,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataEvent {
    /// Historical candles (HTTP backfill), in either time order.
    HistoryBatch {
        cadence: Cadence,
        candles: Vec<Candle>,
    },
    /// Live candle; repeats for a still-open bar overwrite it in place.
    LiveCandle(Candle),
    /// Explicit data gap (optional - gaps are typically implicit).
    Gap { from: Timestamp, to: Timestamp },
    /// Discard every bar at or after `from`, e.g. before re-fetching them.
    Truncate { from: Timestamp },
    /// Reset symbol state.
    Reset,
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("cadence mismatch: store is {expected}, batch is {got}")]
    CadenceMismatch { expected: Cadence, got: Cadence },
    #[error("store error: {0}")]
    Store(#[from] SeriesError),
    #[error("source error: {0}")]
    Source(String),
}

/// Consumer interface for feed events.
pub trait DataSink {
    fn on_event(&mut self, event: DataEvent) -> Result<(), FeedError>;
}

/// The series store of a single symbol, fed by `DataEvent`s.
pub struct FeedStore {
    symbol: String,
    store: SeriesStore<f64>,
    last_report: BatchReport,
}

impl FeedStore {
    pub fn new(symbol: impl Into<String>, config: &StoreConfig) -> Result<Self, FeedError> {
        Ok(Self {
            symbol: symbol.into(),
            store: SeriesStore::from_config(config)?,
            last_report: BatchReport::default(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn cadence(&self) -> Cadence {
        self.store.cadence()
    }

    pub fn store(&self) -> &SeriesStore<f64> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SeriesStore<f64> {
        &mut self.store
    }

    /// Outcome counts of the most recent history batch.
    pub fn last_report(&self) -> BatchReport {
        self.last_report
    }
}

impl DataSink for FeedStore {
    fn on_event(&mut self, event: DataEvent) -> Result<(), FeedError> {
        match event {
            DataEvent::HistoryBatch { cadence, candles } => {
                if cadence != self.store.cadence() {
                    tracing::warn!(
                        symbol = %self.symbol,
                        expected = %self.store.cadence(),
                        got = %cadence,
                        "rejected history batch"
                    );
                    return Err(FeedError::CadenceMismatch {
                        expected: self.store.cadence(),
                        got: cadence,
                    });
                }
                self.last_report = self.store.upsert_all(&candles);
                if self.last_report.dropped > 0 {
                    tracing::warn!(
                        symbol = %self.symbol,
                        dropped = self.last_report.dropped,
                        "history older than the store window was dropped"
                    );
                }
            }
            DataEvent::LiveCandle(c) => {
                self.store.upsert(c.ts, c.fields());
            }
            DataEvent::Gap { .. } => {
                // Gaps are implicit via missing timestamps.
            }
            DataEvent::Truncate { from } => {
                let removed = self.store.clear_from(from);
                tracing::debug!(symbol = %self.symbol, from, removed, "truncated");
            }
            DataEvent::Reset => {
                self.store.reset();
            }
        }
        Ok(())
    }
}

/// Abstract data source: concrete implementations live in platform-specific crates.
pub type DataStream<E> = Pin<Box<dyn Stream<Item = Result<DataEvent, E>> + Send + 'static>>;

pub trait DataSource {
    type Error: std::fmt::Display;

    /// Subscribe to a symbol at a cadence, optionally starting from `from` timestamp.
    fn subscribe(
        &self,
        symbol: &str,
        cadence: Cadence,
        from: Option<Timestamp>,
    ) -> DataStream<Self::Error>;
}

/// Apply every event from `stream` to `sink`, stopping at the first source or
/// sink error. Returns the number of events applied.
pub async fn pump<S, E>(mut stream: DataStream<E>, sink: &mut S) -> Result<usize, FeedError>
where
    S: DataSink,
    E: std::fmt::Display,
{
    let mut applied = 0usize;
    while let Some(item) = stream.next().await {
        let event = item.map_err(|e| FeedError::Source(e.to_string()))?;
        sink.on_event(event)?;
        applied += 1;
    }
    Ok(applied)
}
