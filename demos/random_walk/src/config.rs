//! Demo configuration, loaded from RON

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that stop the demo before the pipeline runs
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] simval_core::Error),
}

/// Settings for one random walk run
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Clock period in milliseconds
    pub interval_ms: u64,
    /// Master seed; `None` seeds from the system time
    pub seed: Option<u64>,
    /// Smallest step the walk can take
    pub min: i64,
    /// Largest step the walk can take
    pub max: i64,
    /// How many times the reset-on-read value is sampled
    pub reads: u32,
    /// Pause between samples in milliseconds
    pub read_interval_ms: u64,
    /// Print a trace line for every update cycle
    pub trace: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            seed: Some(12345),
            min: 1,
            max: 10,
            reads: 10,
            read_interval_ms: 500,
            trace: true,
        }
    }
}

impl DemoConfig {
    pub fn from_ron(text: &str) -> Result<Self, DemoError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, DemoError> {
        Self::from_ron(&std::fs::read_to_string(path)?)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn read_interval(&self) -> Duration {
        Duration::from_millis(self.read_interval_ms)
    }
}
