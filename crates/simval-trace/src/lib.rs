//! Simval Trace - per-cycle tracing for simulated values
//!
//! This crate observes `simval-core` values through their update hooks:
//!
//! - **TraceHook**: Buffers a cycle's callbacks into one [`TraceEvent`]
//! - **format_trace_line**: Renders an event as a single pipe-separated line
//! - **TraceRecorder**: Collects events in memory and exports them
//!
//! # Example
//!
//! ```rust,no_run
//! use simval_core::{Accumulate, Clock, ConstSource, ManualClock, SimpleValue, Value};
//! use simval_trace::{ExportFormat, TraceHook, TraceRecorder};
//! use std::sync::Arc;
//!
//! let clock = ManualClock::shared();
//! let source = ConstSource::shared(clock.clone(), 1i64);
//! let counter = SimpleValue::new(source, vec![Accumulate::shared()]);
//!
//! // Print every cycle as it happens
//! counter.set_update_hook(Some(Arc::new(TraceHook::printing())));
//!
//! // Or keep them for later
//! let recorder = TraceRecorder::new();
//! counter.set_update_hook(Some(recorder.hook()));
//! clock.start();
//! clock.advance(3);
//! println!("{}", recorder.export(ExportFormat::Text)?);
//! # Ok::<(), simval_trace::Error>(())
//! ```

mod error;
mod event;
mod format;
mod hook;
mod recorder;

pub use error::{Error, Result};
pub use event::{TraceEvent, TransformTrace};
pub use format::{format_trace_line, TIMESTAMP_FORMAT};
pub use hook::TraceHook;
pub use recorder::{ExportFormat, TraceRecorder};
