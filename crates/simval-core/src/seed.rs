//! Deterministic seed registry
//!
//! Every random source draws its RNG seed from a registry. Seeding the
//! registry with a master seed before any source is built makes the whole
//! pipeline reproducible: the same master seed and the same construction
//! order give the same value sequences on every run.
//!
//! The process-wide registry is initialized once, either explicitly through
//! [`init`] or lazily from the system time on the first [`next`].
//! [`SeedRegistry::new`] builds an isolated registry for tests.

use crate::task::lock;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

static GLOBAL: OnceLock<SeedRegistry> = OnceLock::new();

/// Initialize the process-wide registry with a master seed
///
/// Only the first call takes effect. Returns `false` if the registry was
/// already initialized, explicitly or by an earlier [`next`].
pub fn init(master_seed: u64) -> bool {
    let mut fresh = false;
    GLOBAL.get_or_init(|| {
        fresh = true;
        SeedRegistry::new(master_seed)
    });
    if fresh {
        debug!(master_seed, "seed registry initialized");
    }
    fresh
}

/// Draw the next seed pair from the process-wide registry
pub fn next() -> (u64, u64) {
    global().next()
}

/// Current state of the process-wide registry, if it has been initialized
pub fn current() -> Option<SeedState> {
    GLOBAL.get().map(SeedRegistry::state)
}

fn global() -> &'static SeedRegistry {
    GLOBAL.get_or_init(SeedRegistry::from_time)
}

/// Build the per-source RNG for a drawn seed pair
///
/// The first word seeds the generator and the second selects its stream, so
/// every pair yields an independent sequence.
pub fn rng_from_pair((seed, stream): (u64, u64)) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Snapshot of a registry, for logging and reproducing a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedState {
    /// The master seed the registry was built from
    pub master_seed: u64,
    /// Number of seed pairs handed out so far
    pub draws: u64,
    /// True if the master seed came from the system time
    pub auto_initialized: bool,
}

/// A deterministic source of independent seed pairs
///
/// Pairs are drawn from a `ChaCha8Rng` seeded by the master seed.
pub struct SeedRegistry {
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    rng: ChaCha8Rng,
    state: SeedState,
}

impl SeedRegistry {
    /// Create a registry from a master seed
    pub fn new(master_seed: u64) -> Self {
        Self::build(master_seed, false)
    }

    /// Create a registry seeded from the system time
    pub fn from_time() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        debug!(master_seed = now, "seed registry auto-initialized from time");
        Self::build(now, true)
    }

    fn build(master_seed: u64, auto_initialized: bool) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                rng: ChaCha8Rng::seed_from_u64(master_seed),
                state: SeedState {
                    master_seed,
                    draws: 0,
                    auto_initialized,
                },
            }),
        }
    }

    /// Hand out the next pair of 64-bit seed words
    pub fn next(&self) -> (u64, u64) {
        let mut inner = lock(&self.inner);
        inner.state.draws += 1;
        (inner.rng.next_u64(), inner.rng.next_u64())
    }

    /// Current registry state
    pub fn state(&self) -> SeedState {
        lock(&self.inner).state
    }
}

impl std::fmt::Debug for SeedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedRegistry")
            .field("state", &self.state())
            .finish()
    }
}
