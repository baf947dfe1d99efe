//! The virtual-queue CAS algorithm shared by the resource-level throttling
//! checker (`sentinel-flow`) and the per-argument hotspot throttling
//! controller (`sentinel-hotspot`) — both are the same leaky-bucket formula,
//! the only difference being which `AtomicI64` cell it runs on.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::clock::Clock;

/// Sentinel meaning "no pass has ever been recorded" for a virtual-queue
/// cell. Using a value far below any real clock reading lets the CAS formula
/// handle the first-ever call without a special branch: `expected` comes out
/// deeply negative, so `expected <= now` is always true and the first caller
/// passes immediately.
pub const UNSET: i64 = i64::MIN / 2;

/// Outcome of one virtual-queue check, before the caller attaches a
/// resource/argument-specific [`crate::error::BlockError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VQueueOutcome {
    Pass,
    Block,
    Wait(Duration),
}

/// Runs the CAS-retry virtual-queue formula against `cell`: computes the
/// next eligible pass time as `prev + interval_between_pass_ns`, and either
/// passes immediately, asks the caller to wait up to `max_queue_ns`, or
/// blocks if the wait would exceed that budget.
///
/// This is a bounded spin-with-yield loop, not an unbounded busy-wait: a
/// failed compare-exchange yields the thread before retrying, so contention
/// degrades to cooperative scheduling rather than livelock.
pub fn check(
    cell: &AtomicI64,
    clock: &dyn Clock,
    interval_between_pass_ns: i64,
    max_queue_ns: i64,
) -> VQueueOutcome {
    loop {
        let prev = cell.load(Ordering::SeqCst);
        let expected = prev.saturating_add(interval_between_pass_ns);
        let now = clock.current_time_nanos();

        if expected <= now {
            if cell
                .compare_exchange_weak(prev, now, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return VQueueOutcome::Pass;
            }
            std::thread::yield_now();
            continue;
        }

        let wait_ns = expected - now;
        if wait_ns >= max_queue_ns {
            return VQueueOutcome::Block;
        }

        if cell
            .compare_exchange_weak(prev, expected, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return VQueueOutcome::Wait(Duration::from_nanos(wait_ns as u64));
        }
        std::thread::yield_now();
    }
}
