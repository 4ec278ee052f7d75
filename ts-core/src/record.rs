use serde::{Deserialize, Serialize};

use crate::Timestamp;

pub trait HasTimestamp {
    fn ts(&self) -> Timestamp;
}

/// A timestamped bundle of named values, as delivered by a feed in batches.
pub trait SeriesRecord<V>: HasTimestamp {
    fn fields(&self) -> Vec<(&str, V)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: Timestamp, // bucket start time
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub const FIELDS: [&'static str; 5] = ["open", "high", "low", "close", "volume"];
}

impl HasTimestamp for Candle {
    fn ts(&self) -> Timestamp {
        self.ts
    }
}

impl SeriesRecord<f64> for Candle {
    fn fields(&self) -> Vec<(&str, f64)> {
        vec![
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
    }
}

/// Free-form record, e.g. derived indicator values written back by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row<V> {
    pub ts: Timestamp,
    pub values: Vec<(String, V)>,
}

impl<V> Row<V> {
    pub fn new(ts: Timestamp) -> Self {
        Self {
            ts,
            values: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: V) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

impl<V> HasTimestamp for Row<V> {
    fn ts(&self) -> Timestamp {
        self.ts
    }
}

impl<V: Clone> SeriesRecord<V> for Row<V> {
    fn fields(&self) -> Vec<(&str, V)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect()
    }
}

/// True when `records` are in non-descending time order, judged by the
/// first and last record.
pub fn is_ascending<R: HasTimestamp>(records: &[R]) -> bool {
    match (records.first(), records.last()) {
        (Some(first), Some(last)) => first.ts() <= last.ts(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_exposes_ohlcv_fields() {
        let c = Candle {
            ts: 60_000,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
        };
        let names: Vec<_> = c.fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, Candle::FIELDS.to_vec());
        assert_eq!(c.fields()[3], ("close", 1.5));
    }

    #[test]
    fn detects_direction_from_ends() {
        let rows = [Row::<f64>::new(3), Row::new(2), Row::new(1)];
        assert!(!is_ascending(&rows));
        assert!(is_ascending(&rows[1..2]));
        assert!(is_ascending::<Row<f64>>(&[]));
        let rows = [Row::<f64>::new(1), Row::new(5)];
        assert!(is_ascending(&rows));
    }
}
