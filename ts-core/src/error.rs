use thiserror::Error;

use crate::Timestamp;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("timestamp {0} is not indexed")]
    TimeNotIndexed(Timestamp),
    #[error("capacity must be at least 2, got {0}")]
    InvalidCapacity(usize),
    #[error("invalid cadence: {0}")]
    InvalidCadence(String),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T, E = SeriesError> = std::result::Result<T, E>;
