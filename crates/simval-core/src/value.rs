//! Stateful values fed by a source
//!
//! A [`SimpleValue`] subscribes to a publisher at construction and runs an
//! update task that folds every incoming value through its transform chain
//! into the current state. Readers sample the state at any time and see
//! either the state before a cycle or the state after it, never an
//! intermediate transform result.
//!
//! One update cycle for an incoming `x`:
//! 1. take the cycle lock and snapshot the pre-cycle state `s0`
//! 2. `on_input(x, s0)`
//! 3. for each transform: `a' = t.apply(a, s0)`, then `on_transform(name, a, a', s0)`
//! 4. commit `a` as the new state and bump the update counter
//! 5. `after_update(a)`

use crate::hook::{guarded, HookRef, HookSlot};
use crate::publisher::{Publisher, Subscription};
use crate::task::{self, lock, read, write};
use crate::transform::{run_chain, State, TransformRef};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tracing::{debug, trace};

/// Element types a value can hold
pub trait Element: Clone + Default + Send + Sync + 'static {}

impl<T: Clone + Default + Send + Sync + 'static> Element for T {}

/// Observable value metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueStats<T> {
    /// Completed update cycles (direct `set_state` calls are not counted)
    pub update_count: u64,
    /// State at the time of the snapshot
    pub current_value: T,
    /// Length of the transform chain
    pub transform_count: usize,
}

/// A readable, clonable, resettable simulated value
pub trait Value<T>: Send + Sync {
    /// Sample the current state
    fn value(&self) -> T;

    /// Overwrite the state directly, bypassing the transform chain
    fn set_state(&self, state: T);

    /// A new value on the same source and chain, starting from `T::default()`
    fn clone_value(&self) -> Box<dyn Value<T>>;

    /// A new value on the same source whose chain is this chain followed by
    /// `transforms`
    fn with_transforms(&self, transforms: Vec<TransformRef<T>>) -> Box<dyn Value<T>>;

    /// Install a hook, or clear it with `None`
    fn set_update_hook(&self, hook: Option<HookRef<T>>);

    /// Snapshot of the value's metrics
    fn stats(&self) -> ValueStats<T>;
}

/// Value driven by a source through a fixed transform chain
pub struct SimpleValue<T: Element> {
    source: Arc<dyn Publisher<T>>,
    transforms: Arc<[TransformRef<T>]>,
    cell: Arc<Cell<T>>,
}

/// State shared between a value handle and its update task
struct Cell<T> {
    /// The committed state and the number of cycles that produced it
    state: RwLock<(T, u64)>,
    /// Serializes update cycles and direct writes
    cycle: Mutex<()>,
    hook: HookSlot<T>,
}

impl<T: Element> SimpleValue<T> {
    /// Subscribe to `source` and start the update task
    pub fn new(source: Arc<dyn Publisher<T>>, transforms: Vec<TransformRef<T>>) -> Self {
        Self::with_chain(source, transforms.into())
    }

    fn with_chain(source: Arc<dyn Publisher<T>>, transforms: Arc<[TransformRef<T>]>) -> Self {
        let cell = Arc::new(Cell {
            state: RwLock::new((T::default(), 0)),
            cycle: Mutex::new(()),
            hook: HookSlot::new(),
        });

        // Subscribe before spawning so the value is registered for the very
        // next source value
        let updates = source.subscribe();
        {
            let cell = Arc::downgrade(&cell);
            let transforms = Arc::clone(&transforms);
            task::spawn("simval-value", move || run(updates, transforms, cell));
        }

        Self {
            source,
            transforms,
            cell,
        }
    }
}

/// The task holds only a weak handle, so dropping the value ends it at the
/// next input and its subscription is pruned from the source.
fn run<T: Element>(
    updates: Subscription<T>,
    transforms: Arc<[TransformRef<T>]>,
    cell: Weak<Cell<T>>,
) {
    for input in updates.iter() {
        let Some(cell) = cell.upgrade() else {
            debug!("value task exited: value dropped");
            return;
        };
        cell.update(input, &transforms);
    }
    let updates = cell.upgrade().map(|cell| read(&cell.state).1);
    debug!(?updates, "value task exited: source closed");
}

impl<T: Element> Cell<T> {
    fn update(&self, input: T, transforms: &[TransformRef<T>]) {
        let _cycle = lock(&self.cycle);
        let hook = self.hook.load();
        let view = State::new(read(&self.state).0.clone());

        if let Some(hook) = &hook {
            guarded("on_input", || hook.on_input(&input, view.get()));
        }

        let next = run_chain(transforms, input, &view, |name, input, output| {
            if let Some(hook) = &hook {
                guarded("on_transform", || {
                    hook.on_transform(name, input, output, view.get())
                });
            }
        });

        let count = {
            let mut state = write(&self.state);
            state.0 = next.clone();
            state.1 += 1;
            state.1
        };
        trace!(update = count, "value updated");

        if let Some(hook) = &hook {
            guarded("after_update", || hook.after_update(&next));
        }
    }

    fn set(&self, value: T) {
        let _cycle = lock(&self.cycle);
        write(&self.state).0 = value.clone();

        if let Some(hook) = self.hook.load() {
            guarded("after_update", || hook.after_update(&value));
        }
    }
}

impl<T: Element> Value<T> for SimpleValue<T> {
    fn value(&self) -> T {
        read(&self.cell.state).0.clone()
    }

    fn set_state(&self, state: T) {
        self.cell.set(state);
    }

    fn clone_value(&self) -> Box<dyn Value<T>> {
        Box::new(Self::with_chain(
            Arc::clone(&self.source),
            Arc::clone(&self.transforms),
        ))
    }

    fn with_transforms(&self, transforms: Vec<TransformRef<T>>) -> Box<dyn Value<T>> {
        let chain: Arc<[TransformRef<T>]> = self
            .transforms
            .iter()
            .cloned()
            .chain(transforms)
            .collect();
        Box::new(Self::with_chain(Arc::clone(&self.source), chain))
    }

    fn set_update_hook(&self, hook: Option<HookRef<T>>) {
        self.cell.hook.set(hook);
    }

    fn stats(&self) -> ValueStats<T> {
        let state = read(&self.cell.state);
        ValueStats {
            update_count: state.1,
            current_value: state.0.clone(),
            transform_count: self.transforms.len(),
        }
    }
}

impl<T: Element + std::fmt::Debug> std::fmt::Debug for SimpleValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("SimpleValue")
            .field("current", &stats.current_value)
            .field("update_count", &stats.update_count)
            .field("transform_count", &stats.transform_count)
            .finish()
    }
}
