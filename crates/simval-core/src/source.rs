//! Clock-driven value sources
//!
//! A [`Source`] turns clock ticks into values. On every tick it asks its
//! [`Generator`] for the next value, bumps its generation counter and hands
//! the value to each subscriber in registration order. The producer task is
//! started lazily by the first [`Publisher::subscribe`] and ends when the
//! clock closes, closing every subscriber stream behind it.
//!
//! Built-in generators:
//! - [`Constant`] - the same value on every tick
//! - [`RandomInt`] - uniform integers in an inclusive range

use crate::clock::Clock;
use crate::publisher::{Fanout, Publisher, Subscription};
use crate::seed::{self, SeedRegistry};
use crate::task::{self, lock};
use crate::{Error, Result};
use crossbeam_channel::Receiver;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// Computes one value per tick
///
/// Generators run on the source's producer task and must not block.
pub trait Generator: Send + 'static {
    type Output: Clone + Send + 'static;

    /// Produce the value for the current tick
    fn generate(&mut self) -> Self::Output;
}

/// Observable source metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    /// Values generated so far (one per tick)
    pub generation_count: u64,
    /// Currently registered subscribers
    pub subscriber_count: usize,
}

/// A publisher that computes a value per clock tick and fans it out
pub struct Source<G: Generator> {
    clock: Arc<dyn Clock>,
    fanout: Arc<Fanout<G::Output>>,
    generation_count: Arc<AtomicU64>,
    /// Taken by the first subscriber, which starts the producer
    pending: Mutex<Option<G>>,
}

impl<G: Generator> Source<G> {
    /// Create a source around any generator
    pub fn with_generator(clock: Arc<dyn Clock>, generator: G) -> Self {
        Self {
            clock,
            fanout: Arc::new(Fanout::new()),
            generation_count: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(Some(generator)),
        }
    }

    /// Snapshot of the source's metrics
    pub fn stats(&self) -> SourceStats {
        SourceStats {
            generation_count: self.generation_count.load(Ordering::Acquire),
            subscriber_count: self.fanout.len(),
        }
    }

    fn start(&self, generator: G) {
        let ticks = self.clock.subscribe();
        let fanout = Arc::clone(&self.fanout);
        let generation_count = Arc::clone(&self.generation_count);
        task::spawn("simval-source", move || {
            run(ticks, generator, fanout, generation_count)
        });
        debug!("source started");
    }
}

impl<G: Generator> Publisher<G::Output> for Source<G> {
    fn subscribe(&self) -> Subscription<G::Output> {
        let rx = self.fanout.subscribe();
        let pending = lock(&self.pending).take();
        if let Some(generator) = pending {
            self.start(generator);
        }
        rx
    }
}

fn run<G: Generator>(
    ticks: Receiver<crate::Tick>,
    mut generator: G,
    fanout: Arc<Fanout<G::Output>>,
    generation_count: Arc<AtomicU64>,
) {
    for _ in ticks.iter() {
        let value = generator.generate();
        let generation = generation_count.fetch_add(1, Ordering::AcqRel) + 1;
        let delivered = fanout.publish(&value);
        trace!(generation, delivered, "source value published");
    }
    fanout.close();
    debug!(
        generations = generation_count.load(Ordering::Acquire),
        "source terminated: clock closed"
    );
}

/// Generator that always yields the same value
#[derive(Debug, Clone)]
pub struct Constant<T> {
    value: T,
}

impl<T> Constant<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone + Send + 'static> Generator for Constant<T> {
    type Output = T;

    fn generate(&mut self) -> T {
        self.value.clone()
    }
}

/// Generator of uniform integers in `[min, max]`
#[derive(Clone)]
pub struct RandomInt {
    min: i64,
    max: i64,
    rng: ChaCha8Rng,
}

impl RandomInt {
    /// Seed from the process-wide registry
    pub fn new(min: i64, max: i64) -> Result<Self> {
        check_range(min, max)?;
        Ok(Self::seeded(min, max, seed::next()))
    }

    /// Seed from an isolated registry
    pub fn from_registry(min: i64, max: i64, registry: &SeedRegistry) -> Result<Self> {
        check_range(min, max)?;
        Ok(Self::seeded(min, max, registry.next()))
    }

    /// Seed from an explicit seed pair
    pub fn from_seeds(min: i64, max: i64, seeds: (u64, u64)) -> Result<Self> {
        check_range(min, max)?;
        Ok(Self::seeded(min, max, seeds))
    }

    fn seeded(min: i64, max: i64, seeds: (u64, u64)) -> Self {
        Self {
            min,
            max,
            rng: seed::rng_from_pair(seeds),
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }
}

impl std::fmt::Debug for RandomInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomInt")
            .field("min", &self.min)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

fn check_range(min: i64, max: i64) -> Result<()> {
    if max < min {
        return Err(Error::InvalidRange { min, max });
    }
    Ok(())
}

impl Generator for RandomInt {
    type Output = i64;

    fn generate(&mut self) -> i64 {
        self.rng.gen_range(self.min..=self.max)
    }
}

/// Source yielding a constant on every tick
pub type ConstSource<T> = Source<Constant<T>>;

/// Source yielding uniform random integers
pub type RandomIntSource = Source<RandomInt>;

impl<T: Clone + Send + 'static> Source<Constant<T>> {
    pub fn new(clock: Arc<dyn Clock>, value: T) -> Self {
        Self::with_generator(clock, Constant::new(value))
    }

    /// Create an Arc-wrapped source for sharing across values
    pub fn shared(clock: Arc<dyn Clock>, value: T) -> Arc<Self> {
        Arc::new(Self::new(clock, value))
    }
}

impl Source<RandomInt> {
    /// Random source seeded from the process-wide registry
    ///
    /// Fails if `max < min`; no seed is drawn in that case.
    pub fn new(clock: Arc<dyn Clock>, min: i64, max: i64) -> Result<Self> {
        Ok(Self::with_generator(clock, RandomInt::new(min, max)?))
    }

    /// Random source seeded from an isolated registry
    pub fn with_registry(
        clock: Arc<dyn Clock>,
        min: i64,
        max: i64,
        registry: &SeedRegistry,
    ) -> Result<Self> {
        Ok(Self::with_generator(
            clock,
            RandomInt::from_registry(min, max, registry)?,
        ))
    }
}
