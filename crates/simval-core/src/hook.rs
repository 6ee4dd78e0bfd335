//! Update hooks observing a value's cycles

use arc_swap::ArcSwapOption;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// Receives notifications during a value's update cycles
///
/// For every cycle a hook sees exactly one `on_input`, then one
/// `on_transform` per transform in chain order, then one `after_update`.
/// A direct `set_state` produces only `after_update`.
///
/// Calls are synchronous on the value's update task. Implementations must
/// not write back into the value they observe. A panicking hook is
/// ignored; the cycle still commits.
pub trait UpdateHook<T>: Send + Sync {
    fn on_input(&self, input: &T, state: &T) {
        let _ = (input, state);
    }

    fn on_transform(&self, name: &str, input: &T, output: &T, state: &T) {
        let _ = (name, input, output, state);
    }

    fn after_update(&self, final_state: &T) {
        let _ = final_state;
    }
}

/// Shared handle to a hook
pub type HookRef<T> = Arc<dyn UpdateHook<T>>;

/// Swappable hook cell; loading never blocks the update path
pub(crate) struct HookSlot<T> {
    slot: ArcSwapOption<HookRef<T>>,
}

impl<T> HookSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    pub(crate) fn set(&self, hook: Option<HookRef<T>>) {
        self.slot.store(hook.map(Arc::new));
    }

    /// The hook for one cycle; swaps during the cycle apply to the next one
    pub(crate) fn load(&self) -> Option<Arc<HookRef<T>>> {
        self.slot.load_full()
    }
}

/// Run one hook callback, absorbing a panic
pub(crate) fn guarded(stage: &'static str, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        debug!(stage, "update hook panicked; ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl UpdateHook<i32> for Counting {
        fn after_update(&self, _final_state: &i32) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_slot_set_and_clear() {
        let slot = HookSlot::<i32>::new();
        assert!(slot.load().is_none());

        let hook = Arc::new(Counting::default());
        slot.set(Some(hook.clone()));
        if let Some(h) = slot.load() {
            h.after_update(&1);
            h.on_input(&1, &0);
        }
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);

        slot.set(None);
        assert!(slot.load().is_none());
    }

    #[test]
    fn test_guarded_absorbs_panic() {
        let mut after = false;
        guarded("test", || panic!("hook failure"));
        guarded("test", || after = true);
        assert!(after);
    }
}
