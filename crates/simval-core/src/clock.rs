//! Tick generators that drive a pipeline
//!
//! A clock emits a unit [`Tick`] to every subscriber. Delivery is lock-step:
//! a tick counts as delivered, and the next one may be produced, only once
//! every current subscriber has taken it or the clock has been stopped.
//!
//! - [`PeriodicClock`] - ticks at a fixed wall-clock interval on its own thread
//! - [`ManualClock`] - ticks only when asked, for deterministic runs

use crate::publisher::{Fanout, Publisher, Subscription};
use crate::task::{self, lock};
use crate::{Error, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A discrete time signal; carries no payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tick;

/// Observable clock metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockStats {
    /// Ticks delivered to all subscribers so far
    pub tick_count: u64,
    /// Whether the clock is currently producing
    pub is_running: bool,
    /// Tick interval (zero for manual clocks)
    pub interval: Duration,
}

/// Provides timing signals for sources
///
/// `start` is one-shot and `stop` is terminal and idempotent. Subscribing
/// after `stop` yields a stream that has already ended.
pub trait Clock: Publisher<Tick> {
    /// Begin emitting ticks
    fn start(&self);

    /// Stop emitting and close every subscription
    fn stop(&self);

    /// Snapshot of the clock's metrics
    fn stats(&self) -> ClockStats;
}

/// Clock that ticks at a fixed interval
pub struct PeriodicClock {
    interval: Duration,
    fanout: Arc<Fanout<Tick>>,
    tick_count: Arc<AtomicU64>,
    running: AtomicBool,
    started: AtomicBool,
    stopped: AtomicBool,
    control: Mutex<Control>,
}

#[derive(Default)]
struct Control {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicClock {
    /// Create an idle clock that will tick every `interval` once started
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::ZeroInterval);
        }
        Ok(Self {
            interval,
            fanout: Arc::new(Fanout::new()),
            tick_count: Arc::new(AtomicU64::new(0)),
            running: AtomicBool::new(false),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            control: Mutex::new(Control::default()),
        })
    }

    /// Create an Arc-wrapped clock for sharing across sources
    pub fn shared(interval: Duration) -> Result<Arc<Self>> {
        Self::new(interval).map(Arc::new)
    }

    /// The configured tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Publisher<Tick> for PeriodicClock {
    fn subscribe(&self) -> Subscription<Tick> {
        self.fanout.subscribe()
    }
}

impl Clock for PeriodicClock {
    fn start(&self) {
        // Held until the producer is registered so a concurrent stop sees it
        let mut control = lock(&self.control);
        if self.stopped.load(Ordering::Acquire) {
            warn!("periodic clock start ignored: clock already stopped");
            return;
        }
        if self.started.swap(true, Ordering::AcqRel) {
            warn!("periodic clock start ignored: clock already started");
            return;
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticker = crossbeam_channel::tick(self.interval);
        let fanout = Arc::clone(&self.fanout);
        let tick_count = Arc::clone(&self.tick_count);

        self.running.store(true, Ordering::Release);
        let handle = task::spawn("simval-clock", move || {
            run_periodic(ticker, stop_rx, fanout, tick_count)
        });
        if handle.is_none() {
            self.running.store(false, Ordering::Release);
        }

        control.stop_tx = Some(stop_tx);
        control.handle = handle;
        debug!(interval = ?self.interval, "periodic clock started");
    }

    fn stop(&self) {
        let (stop_tx, handle) = {
            let mut control = lock(&self.control);
            if self.stopped.swap(true, Ordering::AcqRel) {
                return;
            }
            self.running.store(false, Ordering::Release);
            (control.stop_tx.take(), control.handle.take())
        };
        // Disconnecting the stop channel wakes the producer wherever it blocks
        drop(stop_tx);
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }

        self.fanout.close();
        debug!(
            ticks = self.tick_count.load(Ordering::Acquire),
            "periodic clock stopped"
        );
    }

    fn stats(&self) -> ClockStats {
        ClockStats {
            tick_count: self.tick_count.load(Ordering::Acquire),
            is_running: self.running.load(Ordering::Acquire),
            interval: self.interval,
        }
    }
}

impl Drop for PeriodicClock {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_periodic(
    ticker: Receiver<std::time::Instant>,
    stop: Receiver<()>,
    fanout: Arc<Fanout<Tick>>,
    tick_count: Arc<AtomicU64>,
) {
    loop {
        select! {
            recv(ticker) -> _ => {
                if fanout.publish_until(&Tick, &stop).is_none() {
                    break;
                }
                let n = tick_count.fetch_add(1, Ordering::AcqRel) + 1;
                trace!(tick = n, "tick delivered");
            }
            recv(stop) -> _ => break,
        }
    }
}

/// Clock that ticks only when [`ManualClock::tick`] is called
///
/// Each call delivers one tick synchronously from the calling thread, which
/// makes pipeline runs reproducible.
pub struct ManualClock {
    fanout: Fanout<Tick>,
    tick_count: AtomicU64,
    running: AtomicBool,
    stopped: AtomicBool,
    delivery: Mutex<()>,
    /// Dropped by `stop` to interrupt an in-flight delivery
    stop_tx: Mutex<Option<Sender<()>>>,
    stop_rx: Receiver<()>,
}

impl ManualClock {
    /// Create an idle manual clock
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = bounded(0);
        Self {
            fanout: Fanout::new(),
            tick_count: AtomicU64::new(0),
            running: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            delivery: Mutex::new(()),
            stop_tx: Mutex::new(Some(stop_tx)),
            stop_rx,
        }
    }

    /// Create an Arc-wrapped clock for sharing across sources
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Deliver one tick to every subscriber
    ///
    /// Blocks until each subscriber has taken the tick or the clock is
    /// stopped. Returns `false`, and does not count the tick, if the clock
    /// is not running or the delivery was cut short by `stop`.
    pub fn tick(&self) -> bool {
        let _delivery = lock(&self.delivery);
        if !self.running.load(Ordering::Acquire) {
            return false;
        }
        if self.fanout.publish_until(&Tick, &self.stop_rx).is_none() {
            trace!("manual tick interrupted by stop");
            return false;
        }
        let n = self.tick_count.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(tick = n, "manual tick delivered");
        true
    }

    /// Deliver `count` ticks, returning how many were delivered
    pub fn advance(&self, count: u64) -> u64 {
        (0..count).take_while(|_| self.tick()).count() as u64
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher<Tick> for ManualClock {
    fn subscribe(&self) -> Subscription<Tick> {
        self.fanout.subscribe()
    }
}

impl Clock for ManualClock {
    fn start(&self) {
        if self.stopped.load(Ordering::Acquire) {
            warn!("manual clock start ignored: clock already stopped");
            return;
        }
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("manual clock start ignored: clock already started");
            return;
        }
        debug!("manual clock started");
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.running.store(false, Ordering::Release);
        drop(lock(&self.stop_tx).take());
        self.fanout.close();
        debug!(
            ticks = self.tick_count.load(Ordering::Acquire),
            "manual clock stopped"
        );
    }

    fn stats(&self) -> ClockStats {
        ClockStats {
            tick_count: self.tick_count.load(Ordering::Acquire),
            is_running: self.running.load(Ordering::Acquire),
            interval: Duration::ZERO,
        }
    }
}
