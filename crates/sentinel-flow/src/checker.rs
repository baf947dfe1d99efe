//! The resource-level throttling checker: a virtual-queue leaky bucket.

use std::sync::atomic::AtomicI64;
use std::sync::Arc;

use sentinel_core::vqueue::{self, VQueueOutcome, UNSET};
use sentinel_core::{BlockError, BlockType, SharedClock, TokenResult};

use crate::rule::ThrottlingRule;

/// A per-resource leaky bucket enforcing `rule.threshold()` operations per
/// `rule.interval_ms()`, with up to `rule.timeout_ms()` of queueing before a
/// call is blocked instead of made to wait.
///
/// All state is a single `AtomicI64` holding the nanosecond timestamp of the
/// last granted (virtual) pass; every check runs the shared
/// [`sentinel_core::vqueue`] compare-and-swap retry loop, never a lock.
#[derive(Debug)]
pub struct ThrottlingChecker {
    rule: ThrottlingRule,
    clock: SharedClock,
    last_pass_ns: AtomicI64,
}

impl ThrottlingChecker {
    /// Builds a checker for `rule`, reading time through `clock`.
    pub fn new(rule: ThrottlingRule, clock: SharedClock) -> Self {
        Self {
            rule,
            clock,
            last_pass_ns: AtomicI64::new(UNSET),
        }
    }

    /// Builds a checker using the real system clock.
    pub fn with_system_clock(rule: ThrottlingRule) -> Self {
        Self::new(rule, sentinel_core::clock::system_clock())
    }

    pub fn rule(&self) -> &ThrottlingRule {
        &self.rule
    }

    /// Checks whether `batch_count` units of traffic may proceed against
    /// `threshold` permits per interval, per §4.2 of the governance spec.
    ///
    /// `threshold` is taken per-call (rather than solely from the rule) so a
    /// caller can share one checker across a family of closely related limits,
    /// mirroring the distilled source's `DoCheck(ctx, batchCount, threshold)`
    /// signature.
    pub fn do_check(&self, batch_count: u32, threshold: f64) -> TokenResult {
        if (batch_count as f64) > threshold {
            return TokenResult::Blocked(self.block(batch_count, threshold));
        }

        let interval_between_pass_ns =
            (batch_count as f64 * self.rule.interval_ms() as f64 * 1_000_000.0 / threshold).ceil()
                as i64;
        let max_queue_ns = self.rule.timeout_ms() as i64 * 1_000_000;

        match vqueue::check(
            &self.last_pass_ns,
            self.clock.as_ref(),
            interval_between_pass_ns,
            max_queue_ns,
        ) {
            VQueueOutcome::Pass => TokenResult::Pass,
            VQueueOutcome::Wait(d) => TokenResult::ShouldWait(d),
            VQueueOutcome::Block => TokenResult::Blocked(self.block(batch_count, threshold)),
        }
    }

    /// Convenience form that checks a single unit of traffic against the
    /// rule's own configured threshold.
    pub fn check_one(&self) -> TokenResult {
        self.do_check(1, self.rule.threshold())
    }

    fn block(&self, batch_count: u32, threshold: f64) -> BlockError {
        BlockError::new(
            BlockType::Flow,
            self.rule.resource().to_string(),
            format!("throttled: batch_count={batch_count} exceeds threshold={threshold}"),
        )
        .with_triggered_value(batch_count.to_string())
    }
}

/// Convenience constructor for sharing a checker across threads.
pub fn shared_checker(rule: ThrottlingRule, clock: SharedClock) -> Arc<ThrottlingChecker> {
    Arc::new(ThrottlingChecker::new(rule, clock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sentinel_core::clock::MockClock;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn checker(interval_ms: u32, threshold: f64, timeout_ms: u32, clock: MockClock) -> ThrottlingChecker {
        let rule = ThrottlingRule::builder("svc.ep")
            .interval_ms(interval_ms)
            .threshold(threshold)
            .timeout_ms(timeout_ms)
            .build()
            .unwrap();
        ThrottlingChecker::new(rule, Arc::new(clock))
    }

    /// Scenario S1: throttling single-thread, no queue.
    #[test]
    fn s1_single_thread_no_queue() {
        let clock = MockClock::new();
        let tc = checker(10_000, 50.0, 0, clock.clone());

        assert!(tc.do_check(51, 50.0).is_blocked());
        assert!(tc.do_check(50, 50.0).is_pass());

        for _ in 0..10 {
            assert!(tc.do_check(1, 50.0).is_blocked());
        }

        clock.advance(Duration::from_millis(10_000 / 50 * 10 + 10));

        assert!(tc.do_check(1, 50.0).is_pass());
        assert!(tc.do_check(1, 50.0).is_blocked());
    }

    /// Scenario S2: throttling with queue.
    #[test]
    fn s2_queue_bound() {
        let clock = MockClock::new();
        let tc = checker(10_000, 50.0, 2_000, clock.clone());

        assert!(tc.do_check(1, 50.0).is_pass());

        let mut wait_count = 0;
        let mut block_count = 0;
        for i in 0..20 {
            let result = tc.do_check(1, 50.0);
            if let TokenResult::ShouldWait(d) = result {
                wait_count += 1;
                let expected_ms = (i + 1) * 200;
                let got_ms = d.as_millis() as i64;
                assert!(
                    (got_ms - expected_ms as i64).abs() <= 1,
                    "wait {i}: expected ~{expected_ms}ms got {got_ms}ms"
                );
            } else if result.is_blocked() {
                block_count += 1;
            }
        }
        assert_eq!(wait_count, 10);
        assert_eq!(block_count, 10);
    }

    /// Scenario S3: throttling parallel pass.
    #[test]
    fn s3_parallel_pass_exactly_one_winner() {
        let clock = MockClock::new();
        let tc = Arc::new(checker(10_000, 50.0, 0, clock));

        let threads = 512;
        let barrier = Arc::new(Barrier::new(threads));
        let pass_count = Arc::new(AtomicI32::new(0));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let tc = Arc::clone(&tc);
                let barrier = Arc::clone(&barrier);
                let pass_count = Arc::clone(&pass_count);
                std::thread::spawn(move || {
                    barrier.wait();
                    if tc.do_check(1, 50.0).is_pass() {
                        pass_count.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(pass_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn property_rate_bound_exactly_one_pass_at_time_zero() {
        let clock = MockClock::new();
        let tc = checker(10_000, 50.0, 0, clock);

        let mut passes = 0;
        for _ in 0..25 {
            if tc.do_check(1, 50.0).is_pass() {
                passes += 1;
            }
        }
        assert_eq!(passes, 1);
    }

    #[test]
    fn zero_timeout_never_waits() {
        let clock = MockClock::new();
        let tc = checker(10_000, 50.0, 0, clock);
        assert!(tc.do_check(1, 50.0).is_pass());
        for _ in 0..5 {
            let result = tc.do_check(1, 50.0);
            assert!(!result.is_should_wait());
            assert!(result.is_blocked());
        }
    }

    proptest! {
        /// Property 3: the k-th `ShouldWait` returns a wait close to
        /// `k * (1e9 * interval_ms / (1000 * threshold))` nanoseconds.
        #[test]
        fn property_wait_monotonicity(
            threshold_u in 1u32..50,
            interval_ms in 100u32..20_000,
        ) {
            let threshold = threshold_u as f64;
            let clock = MockClock::new();
            let tc = checker(interval_ms, threshold, 200_000_000, clock);

            prop_assert!(tc.do_check(1, threshold).is_pass());

            let step_ns = 1_000_000_000.0 * interval_ms as f64 / (1000.0 * threshold);
            for k in 1..=5i64 {
                match tc.do_check(1, threshold) {
                    TokenResult::ShouldWait(d) => {
                        let got_ns = d.as_nanos() as f64;
                        let expected_ns = k as f64 * step_ns;
                        let tolerance = step_ns * 0.01 + 1.0;
                        prop_assert!(
                            (got_ns - expected_ns).abs() <= tolerance,
                            "k={}: expected ~{}ns got {}ns",
                            k,
                            expected_ns,
                            got_ns
                        );
                    }
                    other => prop_assert!(false, "expected ShouldWait at k={}, got {:?}", k, other),
                }
            }
        }
    }
}
