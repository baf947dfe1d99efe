//! Per-resource rule registries: resource-level throttling and per-argument
//! hotspot entries. Both follow the same "build the new checker/controller,
//! then replace the resource's slot under a write lock" discipline the
//! breaker and gray registries already use elsewhere in this workspace.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use sentinel_core::{SharedClock, Value};
use sentinel_flow::{ThrottlingChecker, ThrottlingRule};
use sentinel_hotspot::{
    ControlBehavior, HotspotConcurrencyController, HotspotRejectController, HotspotRule,
    HotspotThrottlingController, MetricType,
};

/// One installed hotspot rule's live controller.
pub enum HotspotEntry {
    Reject(HotspotRejectController),
    Throttling(HotspotThrottlingController),
    Concurrency(Arc<HotspotConcurrencyController>),
}

impl HotspotEntry {
    fn from_rule(rule: HotspotRule, clock: SharedClock) -> Self {
        match rule.metric_type() {
            MetricType::Concurrency => HotspotEntry::Concurrency(Arc::new(HotspotConcurrencyController::new(rule))),
            MetricType::Qps => match rule.control_behavior() {
                ControlBehavior::Reject => HotspotEntry::Reject(HotspotRejectController::new(rule, clock)),
                ControlBehavior::Throttling => {
                    HotspotEntry::Throttling(HotspotThrottlingController::new(rule, clock))
                }
            },
        }
    }

    pub fn rule(&self) -> &HotspotRule {
        match self {
            HotspotEntry::Reject(c) => c.rule(),
            HotspotEntry::Throttling(c) => c.rule(),
            HotspotEntry::Concurrency(c) => c.rule(),
        }
    }
}

/// Resource -> installed [`sentinel_flow::rule::ThrottlingRule`] checker.
#[derive(Default)]
pub struct ThrottlingRegistry {
    checkers: RwLock<HashMap<String, Arc<ThrottlingChecker>>>,
}

impl ThrottlingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the throttling checker for `rule.resource()`.
    pub fn install(&self, rule: ThrottlingRule, clock: SharedClock) -> Arc<ThrottlingChecker> {
        let resource = rule.resource().to_string();
        let checker = Arc::new(ThrottlingChecker::new(rule, clock));
        self.checkers.write().insert(resource, Arc::clone(&checker));
        checker
    }

    pub fn remove(&self, resource: &str) {
        self.checkers.write().remove(resource);
    }

    pub fn for_resource(&self, resource: &str) -> Option<Arc<ThrottlingChecker>> {
        self.checkers.read().get(resource).cloned()
    }
}

/// Resource -> installed hotspot rules. Unlike throttling, a resource may
/// accumulate several hotspot rules (distinct parameters, distinct metric
/// types) that all apply to the same entry.
#[derive(Default)]
pub struct HotspotRegistry {
    entries: RwLock<HashMap<String, Vec<Arc<HotspotEntry>>>>,
}

impl HotspotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new hotspot rule for its resource, alongside any existing
    /// rules for that resource.
    pub fn install(&self, rule: HotspotRule, clock: SharedClock) -> Arc<HotspotEntry> {
        let resource = rule.resource().to_string();
        let entry = Arc::new(HotspotEntry::from_rule(rule, clock));
        self.entries.write().entry(resource).or_default().push(Arc::clone(&entry));
        entry
    }

    /// Removes every hotspot rule installed for `resource`.
    pub fn clear(&self, resource: &str) {
        self.entries.write().remove(resource);
    }

    pub fn for_resource(&self, resource: &str) -> Vec<Arc<HotspotEntry>> {
        self.entries.read().get(resource).cloned().unwrap_or_default()
    }
}

/// Dispatches a single hotspot entry against an already-extracted value.
/// Pulled out so the hotspot slot doesn't need to match on the enum itself.
pub(crate) fn perform_hotspot_entry(
    entry: &HotspotEntry,
    value: &Value,
    ctx: &sentinel_core::EntryContext,
) -> sentinel_core::TokenResult {
    match entry {
        HotspotEntry::Reject(c) => c.perform(value, 1),
        HotspotEntry::Throttling(c) => c.perform(value, 1),
        HotspotEntry::Concurrency(c) => {
            let (result, permit) = c.acquire_guarded(value);
            if let Some(permit) = permit {
                ctx.push_guard(permit);
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::clock::system_clock;

    #[test]
    fn throttling_install_then_lookup() {
        let registry = ThrottlingRegistry::new();
        assert!(registry.for_resource("svc.ep").is_none());
        let rule = ThrottlingRule::builder("svc.ep").threshold(10.0).build().unwrap();
        registry.install(rule, system_clock());
        assert!(registry.for_resource("svc.ep").is_some());
        registry.remove("svc.ep");
        assert!(registry.for_resource("svc.ep").is_none());
    }

    #[test]
    fn hotspot_accumulates_multiple_rules_per_resource() {
        let registry = HotspotRegistry::new();
        let rule_a = HotspotRule::builder("svc.ep").threshold(10.0).build().unwrap();
        let rule_b = HotspotRule::builder("svc.ep")
            .metric_type(MetricType::Concurrency)
            .threshold(5.0)
            .build()
            .unwrap();
        registry.install(rule_a, system_clock());
        registry.install(rule_b, system_clock());
        assert_eq!(registry.for_resource("svc.ep").len(), 2);
        registry.clear("svc.ep");
        assert!(registry.for_resource("svc.ep").is_empty());
    }
}
