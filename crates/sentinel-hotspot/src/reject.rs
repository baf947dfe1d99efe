//! Hotspot reject controller: a per-argument token bucket with burst.

use std::sync::atomic::Ordering;

use sentinel_core::{BlockError, BlockType, SharedClock, TokenResult, Value};

use crate::metric::ParamsMetric;
use crate::rule::HotspotRule;

/// Per-parameter token bucket allowing bursts up to `threshold + burst_count`,
/// refilling every `duration_sec`. See §4.3 of the governance spec for the
/// exact CAS-retry sequencing this implements, including the deliberate
/// "`last_refill_ms` updates after the token CAS succeeds" ordering that
/// tolerates a bounded race rather than serializing refills.
pub struct HotspotRejectController {
    rule: HotspotRule,
    metric: ParamsMetric,
    clock: SharedClock,
}

impl HotspotRejectController {
    pub fn new(rule: HotspotRule, clock: SharedClock) -> Self {
        let metric = ParamsMetric::new(&rule);
        Self { rule, metric, clock }
    }

    /// Builds a controller using the real system clock.
    pub fn with_system_clock(rule: HotspotRule) -> Self {
        Self::new(rule, sentinel_core::clock::system_clock())
    }

    pub fn rule(&self) -> &HotspotRule {
        &self.rule
    }

    /// Checks whether `batch_count` units of traffic keyed by `arg` may
    /// proceed.
    pub fn perform(&self, arg: &Value, batch_count: i64) -> TokenResult {
        let key = arg.canonical();
        let effective_threshold = self.rule.effective_threshold(&key);
        if effective_threshold <= 0.0 {
            return TokenResult::Blocked(self.block(&key, batch_count));
        }

        let max_count = (effective_threshold + self.rule.burst_count() as f64).floor() as i64;
        if batch_count > max_count {
            return TokenResult::Blocked(self.block(&key, batch_count));
        }

        loop {
            let now = self.clock.current_time_millis();

            let prev_time_cell = match self.metric.rule_time_counter.add_if_absent(key.clone(), now) {
                None => {
                    // We created the time cell: we are the first caller to touch
                    // this argument. Install the token cell too and pass — no
                    // other caller can have observed "first" for this key.
                    self.metric
                        .rule_token_counter
                        .add_if_absent(key.clone(), max_count - batch_count);
                    return TokenResult::Pass;
                }
                Some(cell) => cell,
            };

            let elapsed = now - prev_time_cell.load(Ordering::SeqCst);
            let window_ms = self.rule.duration_sec() * 1000;

            if elapsed > window_ms {
                match self
                    .metric
                    .rule_token_counter
                    .add_if_absent(key.clone(), max_count - batch_count)
                {
                    None => {
                        prev_time_cell.store(now, Ordering::SeqCst);
                        return TokenResult::Pass;
                    }
                    Some(token_cell) => {
                        let rest = token_cell.load(Ordering::SeqCst);
                        let to_add =
                            (elapsed as f64 * effective_threshold / window_ms as f64) as i64;
                        let new_tokens = (to_add + rest).min(max_count) - batch_count;
                        if new_tokens < 0 {
                            return TokenResult::Blocked(self.block(&key, batch_count));
                        }
                        if token_cell
                            .compare_exchange_weak(rest, new_tokens, Ordering::SeqCst, Ordering::SeqCst)
                            .is_ok()
                        {
                            prev_time_cell.store(now, Ordering::SeqCst);
                            return TokenResult::Pass;
                        }
                        std::thread::yield_now();
                        continue;
                    }
                }
            }

            // Within the current window: spend from the existing bucket.
            let token_cell = match self.metric.rule_token_counter.get(&key) {
                Some(cell) => cell,
                // Time cell survived eviction independently of the token cell
                // (or vice versa): fail open rather than risk a spurious block
                // on state we can no longer trust (§7 InternalIneligible).
                None => return TokenResult::Pass,
            };
            let rest = token_cell.load(Ordering::SeqCst);
            if rest - batch_count < 0 {
                return TokenResult::Blocked(self.block(&key, batch_count));
            }
            if token_cell
                .compare_exchange_weak(rest, rest - batch_count, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return TokenResult::Pass;
            }
            std::thread::yield_now();
        }
    }

    fn block(&self, key: &str, batch_count: i64) -> BlockError {
        BlockError::new(
            BlockType::HotSpotParamFlow,
            self.rule.resource().to_string(),
            format!("hotspot reject: arg={key:?} batch_count={batch_count}"),
        )
        .with_triggered_value(key.to_string())
    }
}
