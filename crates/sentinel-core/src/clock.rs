//! Virtual clock abstraction.
//!
//! Every governance algorithm in this workspace obtains time exclusively through
//! a [`Clock`] implementation rather than calling `SystemTime`/`Instant` directly,
//! so tests can install a [`MockClock`] and drive the refill/queueing logic
//! deterministically without real sleeps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A monotonic, ms/ns-resolution time source.
///
/// Implementations must be cheap to clone and safe to share across threads;
/// the throttling checker and hotspot controllers call `current_time_nanos()`
/// or `current_time_millis()` on every check.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time in milliseconds, resolution and epoch unspecified beyond
    /// "monotonically non-decreasing for the lifetime of the process".
    fn current_time_millis(&self) -> i64;

    /// Current time in nanoseconds, same monotonicity guarantee.
    fn current_time_nanos(&self) -> i64;
}

/// The real wall-clock, backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_time_millis(&self) -> i64 {
        now_unix_nanos() / 1_000_000
    }

    fn current_time_nanos(&self) -> i64 {
        now_unix_nanos()
    }
}

fn now_unix_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos() as i64
}

/// A controllable clock for tests, following the same "install a mock, advance
/// it explicitly" discipline used throughout this workspace's test suites.
///
/// Starts at nanosecond `0`; advance it with [`MockClock::advance`] or jump to
/// an absolute value with [`MockClock::set_nanos`].
#[derive(Debug, Clone)]
pub struct MockClock {
    nanos: Arc<AtomicI64>,
}

impl MockClock {
    /// Creates a new mock clock starting at time zero.
    pub fn new() -> Self {
        Self {
            nanos: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Advances the clock by `duration`.
    pub fn advance(&self, duration: std::time::Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as i64, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute nanosecond value.
    pub fn set_nanos(&self, nanos: i64) {
        self.nanos.store(nanos, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn current_time_millis(&self) -> i64 {
        self.nanos.load(Ordering::SeqCst) / 1_000_000
    }

    fn current_time_nanos(&self) -> i64 {
        self.nanos.load(Ordering::SeqCst)
    }
}

/// A shared, dynamically-dispatched clock handle, the form every governance
/// component actually stores (`Arc<dyn Clock>`).
pub type SharedClock = Arc<dyn Clock>;

/// Returns the default production clock as a [`SharedClock`].
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
