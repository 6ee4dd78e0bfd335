//! Tracing a live pipeline

use simval_core::{Accumulate, Clock, ConstSource, ManualClock, ResetOnRead, SimpleValue, Value};
use simval_trace::{format_trace_line, ExportFormat, TraceRecorder};
use std::time::{Duration, Instant};

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn test_recorder_traces_cycles_and_resets() {
    let clock = ManualClock::shared();
    let source = ConstSource::shared(clock.clone(), 2i64);
    let value = ResetOnRead::new(
        SimpleValue::new(source, vec![Accumulate::shared()]),
        0,
    );
    let recorder = TraceRecorder::new();
    value.set_update_hook(Some(recorder.hook()));
    clock.start();

    clock.advance(2);
    assert!(wait_for(|| recorder.len() == 2));
    assert_eq!(value.value(), 4);
    assert_eq!(recorder.len(), 3);

    let lines: Vec<String> = recorder.events().iter().map(format_trace_line).collect();
    assert!(lines[0].ends_with("] 2 | Accumulate(s:0) | 2"), "{}", lines[0]);
    assert!(lines[1].ends_with("] 2 | Accumulate(s:2) | 4"), "{}", lines[1]);
    assert!(lines[2].ends_with("] SetState | 0"), "{}", lines[2]);

    let text = recorder.export(ExportFormat::Text).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn test_one_recorder_for_many_values() {
    let clock = ManualClock::shared();
    let source = ConstSource::shared(clock.clone(), 1i64);
    let a = SimpleValue::new(source.clone(), vec![Accumulate::shared()]);
    let b = a.clone_value();
    let recorder = TraceRecorder::new();
    a.set_update_hook(Some(recorder.hook()));
    b.set_update_hook(Some(recorder.hook()));
    clock.start();

    clock.advance(3);
    assert!(wait_for(|| recorder.len() == 6));
    assert!(recorder.events().iter().all(|e| e.input == Some(1)));

    let ron = recorder.export(ExportFormat::Ron).unwrap();
    assert!(ron.contains("event_count: 6"));
}
