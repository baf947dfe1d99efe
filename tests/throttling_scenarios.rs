//! Resource-level throttling end-to-end scenarios, driven through the
//! composed engine rather than the bare checker, so they also exercise the
//! slot chain's short-circuit behavior.

use std::sync::Arc;
use std::time::Duration;

use sentinel::{SentinelEngine, SharedClock, ThrottlingRule};
use sentinel_core::clock::MockClock;

fn engine_with_mock_clock() -> (SentinelEngine, Arc<MockClock>) {
    let clock = Arc::new(MockClock::new());
    let engine = SentinelEngine::with_clock(Arc::clone(&clock) as SharedClock);
    (engine, clock)
}

/// S1: single-thread, no queue. interval=10000ms, threshold=50, timeout=0.
#[test]
fn single_thread_no_queue() {
    let (engine, clock) = engine_with_mock_clock();
    let rule = ThrottlingRule::builder("orders.create")
        .interval_ms(10_000)
        .threshold(50.0)
        .timeout_ms(0)
        .build()
        .unwrap();
    engine.throttling().install(rule, Arc::clone(engine.clock()));

    // First call at t=0 passes immediately.
    engine.entry_simple("orders.create").unwrap().into_handle().exit(None);

    // 10 more immediate calls all block (no queueing with timeout_ms=0).
    for _ in 0..10 {
        assert!(engine.entry_simple("orders.create").is_err());
    }

    // Advance past the next virtual slot: 10000/50 = 200ms per slot.
    clock.advance(Duration::from_millis(201));
    engine.entry_simple("orders.create").unwrap().into_handle().exit(None);
    assert!(engine.entry_simple("orders.create").is_err());
}

/// S2: throttling with a queue. 10 of 20 immediate calls should wait,
/// the rest block.
#[test]
fn queued_calls_wait_then_block() {
    let (engine, _clock) = engine_with_mock_clock();
    let rule = ThrottlingRule::builder("orders.create")
        .interval_ms(10_000)
        .threshold(50.0)
        .timeout_ms(2_000)
        .build()
        .unwrap();
    engine.throttling().install(rule, Arc::clone(engine.clock()));

    engine.entry_simple("orders.create").unwrap().into_handle().exit(None);

    let mut waits = 0;
    let mut blocks = 0;
    for _ in 0..20 {
        match engine.entry_simple("orders.create") {
            Ok(decision) => {
                assert!(decision.wait_duration().is_some());
                waits += 1;
                decision.into_handle().exit(None);
            }
            Err(_) => blocks += 1,
        }
    }

    assert_eq!(waits, 10);
    assert_eq!(blocks, 10);
}

/// S3: parallel pass — many threads contend at the same virtual instant;
/// exactly one passes, the rest are blocked.
#[test]
fn parallel_contention_admits_exactly_one() {
    let clock = Arc::new(MockClock::new());
    let engine = Arc::new(SentinelEngine::with_clock(Arc::clone(&clock) as SharedClock));
    let rule = ThrottlingRule::builder("orders.create")
        .interval_ms(10_000)
        .threshold(50.0)
        .timeout_ms(0)
        .build()
        .unwrap();
    engine.throttling().install(rule, Arc::clone(engine.clock()));

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.entry_simple("orders.create").is_ok())
        })
        .collect();

    let passes = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(passes, 1);
}

#[test]
fn distinct_resources_are_governed_independently() {
    let (engine, _clock) = engine_with_mock_clock();
    let rule = ThrottlingRule::builder("orders.create").threshold(1.0).build().unwrap();
    engine.throttling().install(rule, Arc::clone(engine.clock()));

    engine.entry_simple("orders.create").unwrap().into_handle().exit(None);
    assert!(engine.entry_simple("orders.create").is_err());
    // A different, ungoverned resource is unaffected.
    engine.entry_simple("orders.cancel").unwrap().into_handle().exit(None);
}
