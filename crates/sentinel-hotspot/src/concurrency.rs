//! Hotspot concurrency controller: bounds the number of in-flight calls per
//! distinct argument value, per §4.5 of the governance spec.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sentinel_core::{BlockError, BlockType, TokenResult};

use crate::metric::ParamsMetric;
use crate::rule::HotspotRule;

/// Per-argument in-flight counter. Unlike the reject/throttling controllers,
/// this one has no time dimension: a call either fits under the limit right
/// now or it doesn't, and the counter must be decremented again on
/// completion — that release is what [`ConcurrencyPermit`]'s `Drop` does.
pub struct HotspotConcurrencyController {
    rule: HotspotRule,
    metric: Arc<ParamsMetric>,
}

impl HotspotConcurrencyController {
    pub fn new(rule: HotspotRule) -> Self {
        let metric = Arc::new(ParamsMetric::new(&rule));
        Self { rule, metric }
    }

    pub fn rule(&self) -> &HotspotRule {
        &self.rule
    }

    /// Attempts to acquire one in-flight slot for `arg`. On success, the
    /// returned [`ConcurrencyPermit`] must be held for the duration of the
    /// call and dropped on completion to release the slot.
    pub fn acquire(&self, arg: &sentinel_core::Value) -> TokenResult {
        let key = arg.canonical();
        let limit = self.rule.effective_threshold(&key) as i64;
        if limit <= 0 {
            return TokenResult::Blocked(self.block(&key, limit));
        }

        let cell = match self.metric.concurrent_counter.add_if_absent(key.clone(), 1) {
            None => {
                return TokenResult::Pass;
            }
            Some(cell) => cell,
        };

        loop {
            let current = cell.load(Ordering::SeqCst);
            if current >= limit {
                return TokenResult::Blocked(self.block(&key, limit));
            }
            if cell
                .compare_exchange_weak(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return TokenResult::Pass;
            }
            std::thread::yield_now();
        }
    }

    /// Acquires a slot for `arg`, returning a guard that releases it on drop
    /// if (and only if) the acquisition passed.
    pub fn acquire_guarded(
        self: &Arc<Self>,
        arg: &sentinel_core::Value,
    ) -> (TokenResult, Option<ConcurrencyPermit>) {
        let key = arg.canonical();
        match self.acquire(arg) {
            TokenResult::Pass => {
                let permit = ConcurrencyPermit {
                    metric: Arc::clone(&self.metric),
                    key,
                };
                (TokenResult::Pass, Some(permit))
            }
            other => (other, None),
        }
    }

    fn block(&self, key: &str, limit: i64) -> BlockError {
        BlockError::new(
            BlockType::HotSpotParamFlow,
            self.rule.resource().to_string(),
            format!("hotspot concurrency limit reached: arg={key:?} limit={limit}"),
        )
        .with_triggered_value(key.to_string())
    }
}

/// RAII guard releasing one in-flight slot when dropped. Holding this for the
/// lifetime of the governed call is what keeps the counter accurate —
/// forgetting to drop it (e.g. via `mem::forget`) would leak a slot forever.
pub struct ConcurrencyPermit {
    metric: Arc<ParamsMetric>,
    key: String,
}

impl Drop for ConcurrencyPermit {
    fn drop(&mut self) {
        if let Some(cell) = self.metric.concurrent_counter.get(&self.key) {
            cell.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Value;

    fn controller(threshold: f64) -> Arc<HotspotConcurrencyController> {
        let rule = HotspotRule::builder("svc.ep")
            .threshold(threshold)
            .metric_type(crate::rule::MetricType::Concurrency)
            .build()
            .unwrap();
        Arc::new(HotspotConcurrencyController::new(rule))
    }

    #[test]
    fn first_two_callers_pass_then_third_blocks() {
        let c = controller(2.0);
        let arg = Value::from("user-1");
        assert!(c.acquire(&arg).is_pass());
        assert!(c.acquire(&arg).is_pass());
        assert!(c.acquire(&arg).is_blocked());
    }

    #[test]
    fn releasing_a_permit_frees_a_slot() {
        let c = controller(1.0);
        let arg = Value::from("user-1");
        let (first, permit) = c.acquire_guarded(&arg);
        assert!(first.is_pass());
        assert!(c.acquire(&arg).is_blocked());
        drop(permit);
        assert!(c.acquire(&arg).is_pass());
    }

    #[test]
    fn distinct_arguments_have_independent_limits() {
        let c = controller(1.0);
        assert!(c.acquire(&Value::from("a")).is_pass());
        assert!(c.acquire(&Value::from("b")).is_pass());
        assert!(c.acquire(&Value::from("a")).is_blocked());
    }

    #[test]
    fn non_positive_effective_threshold_blocks() {
        let c = controller(0.0);
        assert!(c.acquire(&Value::from("anyone")).is_blocked());
    }
}
