use std::sync::Arc;

use sentinel_core::{EntryContext, Slot, TokenResult};

use crate::registry::ThrottlingRegistry;

use super::THROTTLING_SLOT_ORDER;

/// Bridges an entry's resource to its installed resource-level throttling
/// checker, if any. A resource with no installed rule is ungoverned here and
/// always passes.
pub struct ThrottlingSlot {
    registry: Arc<ThrottlingRegistry>,
}

impl ThrottlingSlot {
    pub fn new(registry: Arc<ThrottlingRegistry>) -> Self {
        Self { registry }
    }
}

impl Slot for ThrottlingSlot {
    fn order(&self) -> u32 {
        THROTTLING_SLOT_ORDER
    }

    fn on_entry(&self, ctx: &EntryContext) -> TokenResult {
        match self.registry.for_resource(ctx.resource()) {
            Some(checker) => checker.check_one(),
            None => TokenResult::Pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::clock::system_clock;
    use sentinel_core::{RequestInput, ResourceKind, TrafficDirection};
    use sentinel_flow::ThrottlingRule;

    fn ctx(resource: &str) -> EntryContext {
        EntryContext::new(resource, TrafficDirection::Inbound, ResourceKind::Common, RequestInput::default(), 0)
    }

    #[test]
    fn unbound_resource_always_passes() {
        let registry = Arc::new(ThrottlingRegistry::new());
        let slot = ThrottlingSlot::new(registry);
        assert!(slot.on_entry(&ctx("svc.ep")).is_pass());
    }

    #[test]
    fn bound_resource_is_governed_by_its_checker() {
        let registry = Arc::new(ThrottlingRegistry::new());
        let rule = ThrottlingRule::builder("svc.ep").threshold(1.0).build().unwrap();
        registry.install(rule, system_clock());
        let slot = ThrottlingSlot::new(registry);

        assert!(slot.on_entry(&ctx("svc.ep")).is_pass());
        assert!(slot.on_entry(&ctx("svc.ep")).is_blocked());
        assert!(slot.on_entry(&ctx("other")).is_pass());
    }
}
