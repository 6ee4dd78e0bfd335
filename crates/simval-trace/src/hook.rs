//! An update hook that turns callbacks into trace events

use crate::event::{TraceEvent, TransformTrace};
use crate::format::format_trace_line;
use chrono::{DateTime, Local};
use simval_core::UpdateHook;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

type Sink<T> = Box<dyn Fn(TraceEvent<T>) + Send + Sync>;

/// Buffers one cycle's callbacks and emits a [`TraceEvent`] per cycle
///
/// `on_input` opens a cycle, `on_transform` appends to it and
/// `after_update` closes it. An `after_update` with no open cycle is a
/// direct `set_state` write. The sink runs after the buffer is released,
/// on the value's update task.
pub struct TraceHook<T> {
    sink: Sink<T>,
    pending: Mutex<Option<Pending<T>>>,
}

struct Pending<T> {
    timestamp: DateTime<Local>,
    input: T,
    transforms: Vec<TransformTrace<T>>,
}

impl<T: Clone + Send + 'static> TraceHook<T> {
    /// Create a hook that hands each completed event to `sink`
    pub fn new(sink: impl Fn(TraceEvent<T>) + Send + Sync + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            pending: Mutex::new(None),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<Pending<T>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Display + Send + 'static> TraceHook<T> {
    /// Print every event to stdout as a trace line
    pub fn printing() -> Self {
        Self::new(|event| println!("{}", format_trace_line(&event)))
    }

    /// Emit every event as an `info` log record
    pub fn logging() -> Self {
        Self::new(|event| {
            info!(
                target: "simval_trace",
                set_state = event.is_set_state(),
                "{}",
                format_trace_line(&event)
            )
        })
    }
}

impl<T: Clone + Send + 'static> UpdateHook<T> for TraceHook<T> {
    fn on_input(&self, input: &T, _state: &T) {
        *self.pending() = Some(Pending {
            timestamp: Local::now(),
            input: input.clone(),
            transforms: Vec::new(),
        });
    }

    fn on_transform(&self, name: &str, input: &T, output: &T, state: &T) {
        if let Some(pending) = self.pending().as_mut() {
            pending.transforms.push(TransformTrace {
                name: name.to_string(),
                input: input.clone(),
                output: output.clone(),
                state: state.clone(),
            });
        }
    }

    fn after_update(&self, final_state: &T) {
        let pending = self.pending().take();
        let event = match pending {
            Some(p) => TraceEvent::cycle(p.timestamp, p.input, p.transforms, final_state.clone()),
            None => TraceEvent::set_state(Local::now(), final_state.clone()),
        };
        (self.sink)(event);
    }
}
