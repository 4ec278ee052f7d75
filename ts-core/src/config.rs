use serde::{Deserialize, Serialize};

use crate::error::{Result, SeriesError};
use crate::Cadence;

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const CADENCE_ENV: &str = "SERIES_CADENCE";
pub const CAPACITY_ENV: &str = "SERIES_CAPACITY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub cadence: Cadence,
    pub capacity: usize,
}

impl StoreConfig {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(2);
        self
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Defaults overridden by `SERIES_CADENCE` (e.g. "4h") and `SERIES_CAPACITY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(CADENCE_ENV) {
            let cadence = raw
                .parse::<Cadence>()
                .map_err(|e| SeriesError::Config(format!("{CADENCE_ENV}: {e}")))?;
            config = config.with_cadence(cadence);
        }
        if let Some(raw) = lookup(CAPACITY_ENV) {
            let capacity = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| SeriesError::Config(format!("{CAPACITY_ENV}: {e}")))?;
            if capacity < 2 {
                return Err(SeriesError::Config(format!(
                    "{CAPACITY_ENV}: capacity must be at least 2, got {capacity}"
                )));
            }
            config = config.with_capacity(capacity);
        }
        Ok(config)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Cadence::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.cadence, Cadence::Days(1));
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn reads_overrides() {
        let config =
            StoreConfig::from_lookup(lookup(&[(CADENCE_ENV, "4h"), (CAPACITY_ENV, " 500 ")]))
                .unwrap();
        assert_eq!(config.cadence, Cadence::Hours(4));
        assert_eq!(config.capacity, 500);
    }

    #[test]
    fn rejects_malformed_values() {
        for vars in [
            [(CADENCE_ENV, "fortnight"), (CAPACITY_ENV, "10")],
            [(CADENCE_ENV, "1d"), (CAPACITY_ENV, "lots")],
            [(CADENCE_ENV, "1d"), (CAPACITY_ENV, "1")],
            [(CADENCE_ENV, "4294967295M"), (CAPACITY_ENV, "10")],
        ] {
            assert!(matches!(
                StoreConfig::from_lookup(lookup(&vars)),
                Err(SeriesError::Config(_))
            ));
        }
    }

    #[test]
    fn builder_clamps_capacity() {
        assert_eq!(StoreConfig::default().with_capacity(0).capacity, 2);
    }

    #[test]
    fn deserializes_from_json() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"cadence":{"Minutes":5},"capacity":64}"#).unwrap();
        assert_eq!(config, StoreConfig::new(Cadence::Minutes(5)).with_capacity(64));
    }
}
