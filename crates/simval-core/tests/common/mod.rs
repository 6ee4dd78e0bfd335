#![allow(dead_code)]

use simval_core::Value;
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(5);

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Block until `value` has completed at least `n` update cycles
pub fn wait_updates(value: &dyn Value<i64>, n: u64) {
    assert!(
        wait_until(WAIT, || value.stats().update_count >= n),
        "value did not reach {n} updates"
    );
}
