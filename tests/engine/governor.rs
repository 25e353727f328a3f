//! Integration tests for the resource governor

use std::sync::Arc;
use std::time::Duration;

use spyglass_engine::{FixedMemoryProbe, Fuse, Limits, MessageKey, ResourceGovernor};

type Log = Vec<(MessageKey, Vec<String>)>;

fn limits() -> Limits {
    Limits {
        max_runtime: None,
        memory_limit: 0,
        min_memory_left: 0,
        max_calls: 0,
        max_depth: 10,
    }
}

#[test]
fn memory_floor_trips_fuse_once() {
    let fuse = Arc::new(Fuse::new());
    let probe = Arc::new(FixedMemoryProbe::new(80));
    let mut gov = ResourceGovernor::with_probe(
        Limits {
            memory_limit: 100,
            min_memory_left: 50,
            ..limits()
        },
        Arc::clone(&fuse),
        probe.clone(),
    );
    let mut log = Log::new();

    assert!(gov.check_break(&mut log));
    assert!(gov.check_break(&mut log));
    assert!(fuse.is_tripped());
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, MessageKey::ResourceExhausted);
    assert_eq!(fuse.trip_count(), 1);
}

#[test]
fn fuse_is_sticky_until_reset() {
    let fuse = Arc::new(Fuse::new());
    let probe = Arc::new(FixedMemoryProbe::new(80));
    let mut gov = ResourceGovernor::with_probe(
        Limits {
            memory_limit: 100,
            min_memory_left: 50,
            ..limits()
        },
        Arc::clone(&fuse),
        probe.clone(),
    );
    let mut log = Log::new();
    assert!(gov.check_break(&mut log));

    probe.set(0);
    let reads = probe.reads();
    assert!(gov.check_break(&mut log));
    assert_eq!(probe.reads(), reads);

    fuse.reset();
    assert!(!gov.check_break(&mut log));
    assert!(!fuse.disable_requested());
}

#[test]
fn fuse_is_shared_between_governors() {
    let fuse = Arc::new(Fuse::new());
    let mut a = ResourceGovernor::new(limits(), Arc::clone(&fuse));
    let mut b = ResourceGovernor::new(limits(), Arc::clone(&fuse));
    let mut log = Log::new();

    assert!(!b.check_break(&mut log));
    fuse.trip();
    assert!(a.check_break(&mut log));
    assert!(b.check_break(&mut log));
}

#[test]
fn runtime_limit() {
    let fuse = Arc::new(Fuse::new());
    let mut gov = ResourceGovernor::new(
        Limits {
            max_runtime: Some(Duration::ZERO),
            ..limits()
        },
        Arc::clone(&fuse),
    );
    let mut log = Log::new();
    gov.check_break(&mut log);
    std::thread::sleep(Duration::from_millis(5));
    assert!(gov.check_break(&mut log));
    assert!(log[0].1[0].contains("max runtime"));
}

#[test]
fn call_budget_warns_then_denies() {
    let mut gov = ResourceGovernor::new(
        Limits {
            max_calls: 3,
            ..limits()
        },
        Arc::new(Fuse::new()),
    );
    let mut log = Log::new();

    assert!(!gov.check_call_budget(&mut log));
    assert!(!gov.check_call_budget(&mut log));
    assert!(gov.check_call_budget(&mut log));
    assert!(gov.check_call_budget(&mut log));

    let keys: Vec<_> = log.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![MessageKey::CallBudgetLow, MessageKey::CallBudgetSpent]);
}

#[test]
fn nesting_counters() {
    let mut gov = ResourceGovernor::new(
        Limits {
            max_depth: 1,
            ..limits()
        },
        Arc::new(Fuse::new()),
    );
    gov.enter_nesting();
    assert!(!gov.check_nesting_too_deep());
    gov.enter_nesting();
    assert!(gov.check_nesting_too_deep());
    assert_eq!(gov.depth(), 2);
    gov.leave_nesting();
    gov.leave_nesting();
    assert_eq!((gov.depth(), gov.deepest()), (0, 2));
}
