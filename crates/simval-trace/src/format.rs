//! Single-line trace formatting

use crate::event::TraceEvent;
use std::fmt::Display;

/// Timestamp layout used in trace lines
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// Render an event as one pipe-separated line
///
/// ```text
/// [12:00:01.250] 3 | Accumulate(s:4) | 7
/// [12:00:01.500] SetState | 0
/// ```
pub fn format_trace_line<T: Display>(event: &TraceEvent<T>) -> String {
    let timestamp = event.timestamp.format(TIMESTAMP_FORMAT);

    let Some(input) = &event.input else {
        return format!("[{}] SetState | {}", timestamp, event.final_state);
    };

    let mut parts = vec![input.to_string()];
    for step in &event.transforms {
        parts.push(format!("{}(s:{})", step.name, step.state));
        parts.push(step.output.to_string());
    }
    format!("[{}] {}", timestamp, parts.join(" | "))
}
