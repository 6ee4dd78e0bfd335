//! Simval Core - clock-driven simulated values
//!
//! This crate provides a small dataflow pipeline for simulated quantities:
//! - Clocks that emit ticks (`PeriodicClock`, `ManualClock`)
//! - Sources that turn ticks into values (`ConstSource`, `RandomIntSource`)
//! - Stateful values that fold source output through transform chains
//! - Update hooks that observe every cycle
//! - A process-wide seed registry for reproducible random sources
//!
//! ## Pipeline
//!
//! ```text
//! Clock --Tick--> Source --T--> Value (transforms, hook) <-- readers
//! ```
//!
//! Every hop is a rendezvous: a clock does not emit its next tick until each
//! subscriber has taken the current one, so a slow stage throttles the whole
//! pipeline instead of queueing.
//!
//! ## Example
//!
//! ```no_run
//! use simval_core::{Accumulate, Clock, ConstSource, PeriodicClock, SimpleValue, Value};
//! use std::time::Duration;
//!
//! let clock = PeriodicClock::shared(Duration::from_millis(10))?;
//! let source = ConstSource::shared(clock.clone(), 1i64);
//! let counter = SimpleValue::new(source, vec![Accumulate::shared()]);
//! clock.start();
//! std::thread::sleep(Duration::from_millis(100));
//! println!("count: {}", counter.value());
//! clock.stop();
//! # Ok::<(), simval_core::Error>(())
//! ```

pub mod clock;
mod error;
mod hook;
mod publisher;
mod reset_on_read;
pub mod seed;
pub mod source;
mod task;
pub mod transform;
mod value;

pub use clock::{Clock, ClockStats, ManualClock, PeriodicClock, Tick};
pub use error::{Error, Result};
pub use hook::{HookRef, UpdateHook};
pub use publisher::{Publisher, Subscription};
pub use reset_on_read::ResetOnRead;
pub use seed::{SeedRegistry, SeedState};
pub use source::{
    ConstSource, Constant, Generator, RandomInt, RandomIntSource, Source, SourceStats,
};
pub use transform::{Accumulate, FnTransform, Numeric, State, Transform, TransformRef};
pub use value::{Element, SimpleValue, Value, ValueStats};
