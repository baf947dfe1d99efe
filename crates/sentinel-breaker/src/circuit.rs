//! The circuit breaker state machine: `Closed` -> `Open` -> `HalfOpen` -> ...,
//! driven by a sliding window of recorded call outcomes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sentinel_core::clock::SharedClock;

use crate::config::{CircuitBreakerConfig, SlidingWindowType};

/// The breaker's current state.
///
/// Mirrored into an [`AtomicU8`] alongside the lock-guarded authoritative copy
/// so hot-path readers (metrics scraping, a quick "is this open" check) never
/// have to take the lock that transition decisions use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }
}

/// One completed call's contribution to the sliding window.
#[derive(Debug, Clone, Copy)]
struct CallRecord {
    at_nanos: i64,
    failed: bool,
    slow: bool,
}

/// Snapshot of a breaker's window counters, for observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitMetrics {
    pub total_count: u64,
    pub failure_count: u64,
    pub slow_call_count: u64,
    pub success_count: u64,
}

struct Inner {
    state: CircuitState,
    last_state_change_nanos: i64,
    half_open_permitted: u32,
    half_open_successes: u32,
    records: VecDeque<CallRecord>,
    metrics: CircuitMetrics,
}

/// A single bound circuit breaker. Constructed from a [`CircuitBreakerConfig`]
/// and driven exclusively through [`Circuit::on_request_complete`] (called by
/// the stat slot) and [`Circuit::try_acquire`] (called before a governed call
/// is allowed to proceed at all).
pub struct Circuit {
    config: CircuitBreakerConfig,
    clock: SharedClock,
    state_atomic: Arc<AtomicU8>,
    inner: parking_lot::Mutex<Inner>,
}

impl Circuit {
    pub fn new(config: CircuitBreakerConfig, clock: SharedClock) -> Self {
        let now = clock.current_time_nanos();
        Self {
            config,
            clock,
            state_atomic: Arc::new(AtomicU8::new(CircuitState::Closed as u8)),
            inner: parking_lot::Mutex::new(Inner {
                state: CircuitState::Closed,
                last_state_change_nanos: now,
                half_open_permitted: 0,
                half_open_successes: 0,
                records: VecDeque::new(),
                metrics: CircuitMetrics::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// A lock-free read of the current state, suitable for metrics or a quick
    /// pre-check; transition decisions always go through the locked path.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    pub fn metrics(&self) -> CircuitMetrics {
        self.inner.lock().metrics
    }

    /// Whether a call may proceed right now. `Closed` always permits;
    /// `Open` permits once `wait_duration_in_open` has elapsed (transitioning
    /// to `HalfOpen` as a side effect); `HalfOpen` permits up to
    /// `permitted_calls_in_half_open` probe calls.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.current_time_nanos();
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = now - inner.last_state_change_nanos;
                if elapsed >= self.config.wait_duration_in_open().as_nanos() as i64 {
                    self.transition_to(&mut inner, CircuitState::HalfOpen, now);
                    inner.half_open_permitted = 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_permitted < self.config.permitted_calls_in_half_open() {
                    inner.half_open_permitted += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records a successful call of duration `rt`, bypassing the failure
    /// classifier. Exposed for direct/manual use; the stat slot bridge calls
    /// [`Circuit::on_request_complete`] instead.
    pub fn record_success(&self, rt: Duration) {
        self.record(rt, false);
    }

    /// Records a failed call, bypassing the failure classifier.
    pub fn record_failure(&self, rt: Duration) {
        self.record(rt, true);
    }

    /// The bridge the circuit-breaker stat slot calls on every completed
    /// entry: classifies `error` per the configured failure classifier and
    /// records the outcome.
    pub fn on_request_complete(&self, rt: Duration, error: Option<&str>) {
        self.record(rt, self.config.is_failure(error));
    }

    fn record(&self, rt: Duration, failed: bool) {
        let now = self.clock.current_time_nanos();
        let slow = rt >= self.config.slow_call_duration_threshold();
        let mut inner = self.inner.lock();

        inner.metrics.total_count += 1;
        if failed {
            inner.metrics.failure_count += 1;
        } else {
            inner.metrics.success_count += 1;
        }
        if slow {
            inner.metrics.slow_call_count += 1;
        }

        if inner.state == CircuitState::HalfOpen {
            if failed {
                self.transition_to(&mut inner, CircuitState::Open, now);
            } else {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.permitted_calls_in_half_open() {
                    self.transition_to(&mut inner, CircuitState::Closed, now);
                }
            }
            return;
        }

        inner.records.push_back(CallRecord { at_nanos: now, failed, slow });
        self.trim_window(&mut inner, now);
        self.evaluate_window(&mut inner, now);
    }

    fn trim_window(&self, inner: &mut Inner, now: i64) {
        match self.config.sliding_window_type() {
            SlidingWindowType::CountBased => {
                let size = self.config.sliding_window_size() as usize;
                while inner.records.len() > size {
                    inner.records.pop_front();
                }
            }
            SlidingWindowType::TimeBased(window) => {
                let cutoff = now - window.as_nanos() as i64;
                while let Some(front) = inner.records.front() {
                    if front.at_nanos < cutoff {
                        inner.records.pop_front();
                    } else {
                        break;
                    }
                }
            }
        }
    }

    fn evaluate_window(&self, inner: &mut Inner, now: i64) {
        let minimum = self.config.minimum_number_of_calls() as usize;
        if inner.records.len() < minimum {
            return;
        }
        if let SlidingWindowType::CountBased = self.config.sliding_window_type() {
            if inner.records.len() < self.config.sliding_window_size() as usize {
                return;
            }
        }

        let total = inner.records.len() as f64;
        let failures = inner.records.iter().filter(|r| r.failed).count() as f64;
        let slow = inner.records.iter().filter(|r| r.slow).count() as f64;

        let failure_rate = failures / total;
        let slow_rate = slow / total;

        if failure_rate >= self.config.failure_rate_threshold()
            || slow_rate >= self.config.slow_call_rate_threshold()
        {
            self.transition_to(inner, CircuitState::Open, now);
        }
    }

    fn transition_to(&self, inner: &mut Inner, to: CircuitState, now: i64) {
        if inner.state == to {
            return;
        }
        inner.state = to;
        inner.last_state_change_nanos = now;
        inner.half_open_permitted = 0;
        inner.half_open_successes = 0;
        inner.records.clear();
        self.state_atomic.store(to as u8, Ordering::Release);
        self.config.events().emit(&crate::event::BreakerEvent::StateTransition {
            resource: self.config.name().to_string(),
            to,
        });
    }
}
