//! Per-rule mutable state: the three bounded LRU counter maps a hotspot rule
//! needs, all keyed by the argument's canonical string form.

use sentinel_core::BoundedLruMap;

use crate::rule::HotspotRule;

/// The counter maps backing one installed [`HotspotRule`].
///
/// Created when the rule is installed, destroyed when the rule is replaced
/// or removed — callers own the lifetime by owning (or `Arc`-sharing) this
/// struct alongside the rule.
pub struct ParamsMetric {
    /// `arg -> last-refill-ms` (reject) or `last-pass-ms` (throttling).
    pub rule_time_counter: BoundedLruMap<String>,
    /// `arg -> tokens-remaining`.
    pub rule_token_counter: BoundedLruMap<String>,
    /// `arg -> in-flight count`.
    pub concurrent_counter: BoundedLruMap<String>,
}

impl ParamsMetric {
    pub fn new(rule: &HotspotRule) -> Self {
        let capacity = rule.counter_capacity();
        Self {
            rule_time_counter: BoundedLruMap::new(capacity),
            rule_token_counter: BoundedLruMap::new(capacity),
            concurrent_counter: BoundedLruMap::new(capacity),
        }
    }
}
