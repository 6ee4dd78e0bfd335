//! Recorded update cycles

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One transform application within a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformTrace<T> {
    pub name: String,
    pub input: T,
    pub output: T,
    /// Pre-cycle state the transform saw
    pub state: T,
}

/// A complete update cycle, or a direct state write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent<T> {
    /// When the cycle began (or when the direct write happened)
    pub timestamp: DateTime<Local>,
    /// The source value that started the cycle; `None` for a direct write
    pub input: Option<T>,
    /// Every transform step in chain order; empty for a direct write
    pub transforms: Vec<TransformTrace<T>>,
    pub final_state: T,
}

impl<T> TraceEvent<T> {
    /// A cycle driven by a source value
    pub fn cycle(
        timestamp: DateTime<Local>,
        input: T,
        transforms: Vec<TransformTrace<T>>,
        final_state: T,
    ) -> Self {
        Self {
            timestamp,
            input: Some(input),
            transforms,
            final_state,
        }
    }

    /// A direct `set_state` write
    pub fn set_state(timestamp: DateTime<Local>, final_state: T) -> Self {
        Self {
            timestamp,
            input: None,
            transforms: Vec::new(),
            final_state,
        }
    }

    pub fn is_set_state(&self) -> bool {
        self.input.is_none()
    }
}
