//! Hotspot throttling controller: the per-argument sibling of
//! [`sentinel_flow::checker::ThrottlingChecker`] — same virtual-queue formula,
//! run on one atomic cell per distinct argument value instead of one shared
//! cell per resource.

use sentinel_core::vqueue::{self, VQueueOutcome, UNSET};
use sentinel_core::{BlockError, BlockType, SharedClock, TokenResult, Value};

use crate::metric::ParamsMetric;
use crate::rule::HotspotRule;

/// Leaky-bucket throttling keyed by argument, per §4.4 of the governance
/// spec. `rule.max_queue_ms()` of `0` means reject at once rather than queue,
/// matching the resource-level checker's treatment of a zero timeout.
pub struct HotspotThrottlingController {
    rule: HotspotRule,
    metric: ParamsMetric,
    clock: SharedClock,
}

impl HotspotThrottlingController {
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
    /// proceed, queue, or must be blocked.
    pub fn perform(&self, arg: &Value, batch_count: i64) -> TokenResult {
        let key = arg.canonical();
        let effective_threshold = self.rule.effective_threshold(&key);
        if effective_threshold <= 0.0 {
            return TokenResult::Blocked(self.block(&key, batch_count));
        }
        if (batch_count as f64) > effective_threshold {
            return TokenResult::Blocked(self.block(&key, batch_count));
        }

        let interval_between_pass_ns = (batch_count as f64
            * self.rule.duration_sec() as f64
            * 1_000_000_000.0
            / effective_threshold)
            .ceil() as i64;
        let max_queue_ns = self.rule.max_queue_ms() * 1_000_000;

        // The cell is created lazily, first-caller-wins, same discipline as
        // the hotspot reject controller's time counter: `add_if_absent`
        // returning `None` means we just installed it ourselves.
        let cell = match self.metric.rule_time_counter.add_if_absent(key.clone(), UNSET) {
            None => return TokenResult::Pass,
            Some(cell) => cell,
        };

        match vqueue::check(&cell, self.clock.as_ref(), interval_between_pass_ns, max_queue_ns) {
            VQueueOutcome::Pass => TokenResult::Pass,
            VQueueOutcome::Wait(d) => TokenResult::ShouldWait(d),
            VQueueOutcome::Block => TokenResult::Blocked(self.block(&key, batch_count)),
        }
    }

    fn block(&self, key: &str, batch_count: i64) -> BlockError {
        BlockError::new(
            BlockType::HotSpotParamFlow,
            self.rule.resource().to_string(),
            format!("hotspot throttled: arg={key:?} batch_count={batch_count}"),
        )
        .with_triggered_value(key.to_string())
    }
}
