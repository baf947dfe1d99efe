use std::collections::HashMap;

use sentinel_core::{ConfigurationError, ParamKind};

/// Which metric a [`HotspotRule`] governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Rate-based: token bucket (reject) or leaky bucket (throttling), chosen
    /// by [`ControlBehavior`].
    Qps,
    /// In-flight count, enforced by [`crate::concurrency::HotspotConcurrencyController`].
    Concurrency,
}

/// For a [`MetricType::Qps`] rule, which rate-limiting algorithm governs it.
/// Ignored for [`MetricType::Concurrency`] rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlBehavior {
    /// Token bucket with burst: [`crate::reject::HotspotRejectController`].
    Reject,
    /// Leaky bucket with an optional queue: [`crate::throttling::HotspotThrottlingController`].
    Throttling,
}

/// Where the argument extractor pulls the governance key from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Header,
    Metadata,
    Attachment,
    /// Positional argument (or a dotted path into a structured first argument).
    Arg,
}

/// A bounded-memory constant and a duration-scaled one, combined per §4.1 to
/// size each rule's LRU maps. Mirrors the constants this class of engine has
/// historically shipped with (20k entries max, scaled 4k per second of
/// window, with a 100-entry floor so a 1-second window isn't pathologically
/// small).
const PARAMS_MAX_CAPACITY: usize = 20_000;
const PARAMS_CAPACITY_BASE: usize = 4_000;
const PARAMS_MIN_CAPACITY: usize = 100;
const CONCURRENCY_MAX_CAPACITY: usize = 4_000;

/// Configuration for a hotspot (per-parameter) traffic-shaping rule.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotRule {
    pub(crate) resource: String,
    pub(crate) metric_type: MetricType,
    pub(crate) control_behavior: ControlBehavior,
    pub(crate) param_source: ParamSource,
    pub(crate) param_key: String,
    pub(crate) param_kind: ParamKind,
    pub(crate) param_index: i32,
    pub(crate) threshold: f64,
    pub(crate) duration_sec: i64,
    pub(crate) burst_count: i64,
    pub(crate) max_queue_ms: i64,
    pub(crate) specific_items: HashMap<String, f64>,
    pub(crate) params_max_capacity: i32,
}

impl HotspotRule {
    pub fn builder(resource: impl Into<String>) -> HotspotRuleBuilder {
        HotspotRuleBuilder::new(resource)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn control_behavior(&self) -> ControlBehavior {
        self.control_behavior
    }

    pub fn param_source(&self) -> ParamSource {
        self.param_source
    }

    pub fn param_key(&self) -> &str {
        &self.param_key
    }

    pub fn param_kind(&self) -> ParamKind {
        self.param_kind
    }

    pub fn param_index(&self) -> i32 {
        self.param_index
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn duration_sec(&self) -> i64 {
        self.duration_sec
    }

    pub fn burst_count(&self) -> i64 {
        self.burst_count
    }

    pub fn max_queue_ms(&self) -> i64 {
        self.max_queue_ms
    }

    pub fn specific_items(&self) -> &HashMap<String, f64> {
        &self.specific_items
    }

    /// Per-key threshold override, falling back to the rule's own threshold.
    pub fn effective_threshold(&self, key: &str) -> f64 {
        self.specific_items.get(key).copied().unwrap_or(self.threshold)
    }

    /// Capacity for this rule's LRU counter maps, per §4.1: an explicit
    /// `params_max_capacity` override wins outright; otherwise concurrency
    /// rules get a fixed default and QPS rules scale with `duration_sec`,
    /// clamped between a floor and the global ceiling.
    pub fn counter_capacity(&self) -> usize {
        if self.params_max_capacity > 0 {
            return self.params_max_capacity as usize;
        }
        match self.metric_type {
            MetricType::Concurrency => CONCURRENCY_MAX_CAPACITY,
            MetricType::Qps => {
                let by_duration = PARAMS_CAPACITY_BASE.saturating_mul(self.duration_sec.max(1) as usize);
                by_duration.min(PARAMS_MAX_CAPACITY).max(PARAMS_MIN_CAPACITY)
            }
        }
    }
}

/// Builder for [`HotspotRule`], validated on [`build`](Self::build).
pub struct HotspotRuleBuilder {
    resource: String,
    metric_type: MetricType,
    control_behavior: ControlBehavior,
    param_source: ParamSource,
    param_key: String,
    param_kind: ParamKind,
    param_index: i32,
    threshold: f64,
    duration_sec: i64,
    burst_count: i64,
    max_queue_ms: i64,
    specific_items: HashMap<String, f64>,
    params_max_capacity: i32,
}

impl HotspotRuleBuilder {
    fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            metric_type: MetricType::Qps,
            control_behavior: ControlBehavior::Reject,
            param_source: ParamSource::Arg,
            param_key: String::new(),
            param_kind: ParamKind::String,
            param_index: 0,
            threshold: 0.0,
            duration_sec: 1,
            burst_count: 0,
            max_queue_ms: 0,
            specific_items: HashMap::new(),
            params_max_capacity: 0,
        }
    }

    pub fn metric_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    pub fn control_behavior(mut self, control_behavior: ControlBehavior) -> Self {
        self.control_behavior = control_behavior;
        self
    }

    pub fn param_source(mut self, param_source: ParamSource) -> Self {
        self.param_source = param_source;
        self
    }

    pub fn param_key(mut self, param_key: impl Into<String>) -> Self {
        self.param_key = param_key.into();
        self
    }

    pub fn param_kind(mut self, param_kind: ParamKind) -> Self {
        self.param_kind = param_kind;
        self
    }

    pub fn param_index(mut self, param_index: i32) -> Self {
        self.param_index = param_index;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn duration_sec(mut self, duration_sec: i64) -> Self {
        self.duration_sec = duration_sec;
        self
    }

    pub fn burst_count(mut self, burst_count: i64) -> Self {
        self.burst_count = burst_count;
        self
    }

    pub fn max_queue_ms(mut self, max_queue_ms: i64) -> Self {
        self.max_queue_ms = max_queue_ms;
        self
    }

    pub fn specific_item(mut self, key: impl Into<String>, threshold: f64) -> Self {
        self.specific_items.insert(key.into(), threshold);
        self
    }

    pub fn params_max_capacity(mut self, capacity: i32) -> Self {
        self.params_max_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<HotspotRule, ConfigurationError> {
        if self.resource.trim().is_empty() {
            return Err(ConfigurationError::EmptyResource);
        }
        if self.duration_sec <= 0 {
            return Err(ConfigurationError::Invalid {
                resource: self.resource,
                reason: "duration_sec must be positive".to_string(),
            });
        }
        Ok(HotspotRule {
            resource: self.resource,
            metric_type: self.metric_type,
            control_behavior: self.control_behavior,
            param_source: self.param_source,
            param_key: self.param_key,
            param_kind: self.param_kind,
            param_index: self.param_index,
            threshold: self.threshold,
            duration_sec: self.duration_sec,
            burst_count: self.burst_count,
            max_queue_ms: self.max_queue_ms,
            specific_items: self.specific_items,
            params_max_capacity: self.params_max_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_resource() {
        let err = HotspotRule::builder("  ").threshold(10.0).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyResource));
    }

    #[test]
    fn rejects_non_positive_duration() {
        let err = HotspotRule::builder("svc.ep")
            .threshold(10.0)
            .duration_sec(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Invalid { .. }));
    }

    #[test]
    fn capacity_scales_with_duration_and_clamps() {
        let rule = HotspotRule::builder("svc.ep")
            .threshold(10.0)
            .duration_sec(1)
            .build()
            .unwrap();
        assert_eq!(rule.counter_capacity(), PARAMS_MIN_CAPACITY.max(PARAMS_CAPACITY_BASE));

        let rule = HotspotRule::builder("svc.ep")
            .threshold(10.0)
            .duration_sec(100)
            .build()
            .unwrap();
        assert_eq!(rule.counter_capacity(), PARAMS_MAX_CAPACITY);
    }

    #[test]
    fn explicit_capacity_override_wins() {
        let rule = HotspotRule::builder("svc.ep")
            .threshold(10.0)
            .params_max_capacity(42)
            .build()
            .unwrap();
        assert_eq!(rule.counter_capacity(), 42);
    }

    #[test]
    fn effective_threshold_prefers_specific_item() {
        let rule = HotspotRule::builder("svc.ep")
            .threshold(10.0)
            .specific_item("vip", 100.0)
            .build()
            .unwrap();
        assert_eq!(rule.effective_threshold("vip"), 100.0);
        assert_eq!(rule.effective_threshold("anyone-else"), 10.0);
    }
}
