//! Pipeline task spawning and lock helpers
//!
//! Every clock, source and value runs on its own named thread. Hooks run
//! under `catch_unwind`, so a poisoned lock never guards a half-written
//! state and is recovered rather than propagated.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use tracing::error;

/// Spawn a long-lived pipeline task on a named thread
///
/// Returns `None` if the OS refused to create the thread; the failure is
/// logged and the stage simply never produces.
pub(crate) fn spawn<F>(name: &str, task: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    match thread::Builder::new().name(name.to_string()).spawn(task) {
        Ok(handle) => Some(handle),
        Err(err) => {
            error!(task = name, %err, "failed to spawn pipeline task");
            None
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_spawn_runs_task() {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = spawn("simval-test", move || {
            tx.send(thread::current().name().map(str::to_string)).ok();
        });
        assert!(handle.is_some());
        assert_eq!(rx.recv().ok().flatten().as_deref(), Some("simval-test"));
    }

    #[test]
    fn test_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(7));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*lock(&mutex), 7);
    }
}
