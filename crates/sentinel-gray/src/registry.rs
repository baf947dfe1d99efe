//! Resource -> gray selector bindings, copy-on-write so concurrent `choose()`
//! calls never observe a partially-rebuilt weight table.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;

use crate::rule::GrayRule;
use crate::selector::WeightedGraySelector;

/// Maps a resource name to its currently installed gray selector, if any.
#[derive(Default)]
pub struct GrayRegistry {
    slots: RwLock<HashMap<String, Arc<ArcSwapOption<WeightedGraySelector>>>>,
}

impl GrayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or replaces the gray rule for `rule.resource()`. Builds the
    /// new selector first (or `None`, if the rule's weight list is empty)
    /// and then swaps it in atomically; readers already holding a reference
    /// to the prior `Arc` keep a perfectly valid, unmodified snapshot.
    pub fn update(&self, rule: &GrayRule) {
        let new_selector = WeightedGraySelector::from_rule(rule).map(Arc::new);
        let slot = self.slot_for(rule.resource());
        slot.store(new_selector);
    }

    /// Removes any installed selector for `resource`.
    pub fn remove(&self, resource: &str) {
        if let Some(slot) = self.slots.read().get(resource) {
            slot.store(None);
        }
    }

    /// Draws a gray choice for `resource`, or `None` if no selector is
    /// installed (no rule, or the installed rule's weight list is empty).
    pub fn choose(&self, resource: &str) -> Option<crate::selector::GrayChoice> {
        self.slots.read().get(resource).and_then(|slot| slot.load().as_ref().map(|s| s.choose()))
    }

    fn slot_for(&self, resource: &str) -> Arc<ArcSwapOption<WeightedGraySelector>> {
        if let Some(slot) = self.slots.read().get(resource) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .entry(resource.to_string())
                .or_insert_with(|| Arc::new(ArcSwapOption::from(None))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::GrayWeightEntry;

    #[test]
    fn unbound_resource_has_no_choice() {
        let registry = GrayRegistry::new();
        assert!(registry.choose("svc.ep").is_none());
    }

    #[test]
    fn updating_with_an_empty_weight_list_installs_no_selector() {
        let registry = GrayRegistry::new();
        let rule = GrayRule::builder("svc.ep").build().unwrap();
        registry.update(&rule);
        assert!(registry.choose("svc.ep").is_none());
    }

    #[test]
    fn updating_with_candidates_makes_choose_succeed() {
        let registry = GrayRegistry::new();
        let rule = GrayRule::builder("svc.ep")
            .weight_entry(GrayWeightEntry::new(1.0, "svc.ep.canary"))
            .build()
            .unwrap();
        registry.update(&rule);
        assert_eq!(registry.choose("svc.ep").unwrap().resource, "svc.ep.canary");
    }

    #[test]
    fn removing_clears_the_selector() {
        let registry = GrayRegistry::new();
        let rule = GrayRule::builder("svc.ep")
            .weight_entry(GrayWeightEntry::new(1.0, "svc.ep.canary"))
            .build()
            .unwrap();
        registry.update(&rule);
        registry.remove("svc.ep");
        assert!(registry.choose("svc.ep").is_none());
    }
}
