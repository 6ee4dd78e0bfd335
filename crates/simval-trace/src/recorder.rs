//! In-memory trace recording and export

use crate::event::TraceEvent;
use crate::format::format_trace_line;
use crate::hook::TraceHook;
use crate::{Error, Result};
use serde::Serialize;
use simval_core::HookRef;
use std::fmt::Display;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RON format (Rust Object Notation)
    Ron,
    /// One trace line per event
    Text,
}

/// Collects the trace events of one or more values
///
/// Attach it through [`TraceRecorder::hook`]; every hook handed out feeds the
/// same event list.
pub struct TraceRecorder<T> {
    events: Arc<Mutex<Vec<TraceEvent<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> TraceRecorder<T> {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A hook that appends every event to this recorder
    pub fn hook(&self) -> HookRef<T> {
        let events = Arc::clone(&self.events);
        Arc::new(TraceHook::new(move |event| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event)
        }))
    }

    /// Copy of every event recorded so far
    pub fn events(&self) -> Vec<TraceEvent<T>> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceEvent<T>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + Sync + 'static> Default for TraceRecorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TraceRecorder<T>
where
    T: Clone + Display + Serialize + Send + Sync + 'static,
{
    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Ron => self.to_ron(),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Export to RON format
    pub fn to_ron(&self) -> Result<String> {
        let events = self.events();
        let export = ExportData {
            event_count: events.len(),
            set_state_count: events.iter().filter(|e| e.is_set_state()).count(),
            events,
        };
        ron::ser::to_string_pretty(&export, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Export as trace lines, one per event
    pub fn to_text(&self) -> String {
        self.lock()
            .iter()
            .map(|event| format_trace_line(event) + "\n")
            .collect()
    }
}

/// Data structure for full trace export
#[derive(Debug, Clone, Serialize)]
struct ExportData<T> {
    event_count: usize,
    set_state_count: usize,
    events: Vec<TraceEvent<T>>,
}
