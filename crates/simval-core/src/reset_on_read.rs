//! Values that reset when sampled

use crate::hook::HookRef;
use crate::task::lock;
use crate::transform::TransformRef;
use crate::value::{Element, Value, ValueStats};
use std::sync::Mutex;

/// Wraps a value so that every read returns its state and then resets it
///
/// Reads through the same wrapper are serialized: no reader can observe the
/// state another reader has already taken. The wrapper does not pause the
/// pipeline, so an upstream update landing between the read and the reset
/// may be overwritten by the reset, and one landing right after it may
/// immediately replace the reset constant.
pub struct ResetOnRead<T: Element> {
    inner: Box<dyn Value<T>>,
    reset: Mutex<T>,
}

impl<T: Element> ResetOnRead<T> {
    pub fn new<V: Value<T> + 'static>(inner: V, reset: T) -> Self {
        Self::from_boxed(Box::new(inner), reset)
    }

    /// Wrap an already boxed value, such as one returned by `clone_value`
    pub fn from_boxed(inner: Box<dyn Value<T>>, reset: T) -> Self {
        Self {
            inner,
            reset: Mutex::new(reset),
        }
    }

    /// The value reads currently leave behind
    pub fn reset_value(&self) -> T {
        lock(&self.reset).clone()
    }

    pub fn inner(&self) -> &dyn Value<T> {
        self.inner.as_ref()
    }
}

impl<T: Element> Value<T> for ResetOnRead<T> {
    fn value(&self) -> T {
        let reset = lock(&self.reset);
        let current = self.inner.value();
        self.inner.set_state(reset.clone());
        current
    }

    /// Changes the reset constant; the inner state is left alone
    fn set_state(&self, state: T) {
        *lock(&self.reset) = state;
    }

    fn clone_value(&self) -> Box<dyn Value<T>> {
        Box::new(Self::from_boxed(
            self.inner.clone_value(),
            self.reset_value(),
        ))
    }

    fn with_transforms(&self, transforms: Vec<TransformRef<T>>) -> Box<dyn Value<T>> {
        Box::new(Self::from_boxed(
            self.inner.with_transforms(transforms),
            self.reset_value(),
        ))
    }

    fn set_update_hook(&self, hook: Option<HookRef<T>>) {
        self.inner.set_update_hook(hook);
    }

    fn stats(&self) -> ValueStats<T> {
        self.inner.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::hook::UpdateHook;
    use crate::source::ConstSource;
    use crate::task::testing::wait_until;
    use crate::transform::{Accumulate, FnTransform};
    use crate::SimpleValue;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn counter(clock: &Arc<ManualClock>) -> SimpleValue<i64> {
        let source = ConstSource::shared(clock.clone(), 1i64);
        SimpleValue::new(source, vec![Accumulate::shared()])
    }

    fn wait_updates(value: &dyn Value<i64>, n: u64) {
        assert!(wait_until(WAIT, || value.stats().update_count >= n));
    }

    #[test]
    fn test_read_returns_and_resets() {
        let clock = ManualClock::shared();
        let value = ResetOnRead::new(counter(&clock), 0);
        clock.start();

        clock.advance(3);
        wait_updates(&value, 3);
        assert_eq!(value.value(), 3);
        assert_eq!(value.inner().value(), 0);

        clock.advance(2);
        wait_updates(&value, 5);
        assert_eq!(value.value(), 2);
    }

    #[test]
    fn test_set_state_changes_reset_constant() {
        let clock = ManualClock::shared();
        let value = ResetOnRead::new(counter(&clock), 0);
        clock.start();

        value.set_state(10);
        assert_eq!(value.reset_value(), 10);
        // The inner state is untouched until the next read
        assert_eq!(value.inner().value(), 0);

        clock.advance(2);
        wait_updates(&value, 2);
        assert_eq!(value.value(), 2);
        assert_eq!(value.inner().value(), 10);

        clock.tick();
        wait_updates(&value, 3);
        assert_eq!(value.value(), 11);
    }

    #[test]
    fn test_stats_do_not_reset() {
        let clock = ManualClock::shared();
        let value = ResetOnRead::new(counter(&clock), 0);
        clock.start();
        clock.advance(4);
        wait_updates(&value, 4);

        let stats = value.stats();
        assert_eq!(stats.current_value, 4);
        assert_eq!(stats.transform_count, 1);
        assert_eq!(value.stats().current_value, 4);
    }

    #[test]
    fn test_clone_keeps_reset_constant() {
        let clock = ManualClock::shared();
        let original = ResetOnRead::new(counter(&clock), 0);
        original.set_state(-1);
        clock.start();
        clock.advance(2);
        wait_updates(&original, 2);

        let copy = original.clone_value();
        clock.tick();
        wait_updates(&*copy, 1);
        wait_updates(&original, 3);

        assert_eq!(copy.value(), 1);
        // After the read, the clone's inner value holds the shared reset constant
        assert_eq!(copy.stats().current_value, -1);
        assert_eq!(original.value(), 3);
    }

    #[test]
    fn test_with_transforms_wraps_extended_inner() {
        let clock = ManualClock::shared();
        let original = ResetOnRead::new(counter(&clock), 0);
        let tenfold = original.with_transforms(vec![FnTransform::shared(
            "Tenfold",
            |x: i64, _s: &i64| x * 10,
        )]);
        clock.start();

        clock.tick();
        wait_updates(&*tenfold, 1);
        assert_eq!(tenfold.stats().transform_count, 2);
        assert_eq!(tenfold.value(), 10);
        assert_eq!(tenfold.stats().current_value, 0);
    }

    #[test]
    fn test_hook_passes_through() {
        struct Last(AtomicI64);
        impl UpdateHook<i64> for Last {
            fn after_update(&self, final_state: &i64) {
                self.0.store(*final_state, Ordering::SeqCst);
            }
        }

        let clock = ManualClock::shared();
        let value = ResetOnRead::new(counter(&clock), 0);
        let hook = Arc::new(Last(AtomicI64::new(-99)));
        value.set_update_hook(Some(hook.clone()));
        clock.start();

        clock.advance(2);
        wait_updates(&value, 2);
        assert_eq!(hook.0.load(Ordering::SeqCst), 2);

        // The reset is a direct write on the inner value
        assert_eq!(value.value(), 2);
        assert_eq!(hook.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_readers_take_disjoint_totals() {
        let clock = ManualClock::shared();
        let value = Arc::new(ResetOnRead::new(counter(&clock), 0));
        clock.start();
        clock.advance(50);
        wait_updates(&*value, 50);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let value = Arc::clone(&value);
                std::thread::spawn(move || value.value())
            })
            .collect();
        let total: i64 = readers.into_iter().map(|r| r.join().unwrap()).sum();

        // Exactly one reader took the accumulated total
        assert_eq!(total, 50);
        assert_eq!(value.value(), 0);
    }
}
