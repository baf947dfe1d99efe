use std::sync::Arc;

use sentinel_core::{EntryContext, Slot, TokenResult};

use crate::registry::{perform_hotspot_entry, HotspotRegistry};
use crate::request_view::RequestView;

use super::HOTSPOT_SLOT_ORDER;

/// Runs every hotspot rule installed for an entry's resource, in installation
/// order, stopping at the first rule that blocks or asks the caller to wait.
/// A rule whose argument extraction misses is simply skipped — per §4.6, a
/// miss is not itself a reason to block.
pub struct HotspotSlot {
    registry: Arc<HotspotRegistry>,
}

impl HotspotSlot {
    pub fn new(registry: Arc<HotspotRegistry>) -> Self {
        Self { registry }
    }
}

impl Slot for HotspotSlot {
    fn order(&self) -> u32 {
        HOTSPOT_SLOT_ORDER
    }

    fn on_entry(&self, ctx: &EntryContext) -> TokenResult {
        let view = RequestView::new(ctx.input());
        for entry in self.registry.for_resource(ctx.resource()) {
            let value = match sentinel_hotspot::extract(entry.rule(), &view) {
                Some(value) => value,
                None => continue,
            };
            match perform_hotspot_entry(&entry, &value, ctx) {
                TokenResult::Pass => continue,
                other => return other,
            }
        }
        TokenResult::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::clock::system_clock;
    use sentinel_core::{RequestInput, ResourceKind, TrafficDirection, Value};
    use sentinel_hotspot::{HotspotRule, MetricType};

    fn ctx_with_arg(resource: &str, arg: &str) -> EntryContext {
        EntryContext::new(
            resource,
            TrafficDirection::Inbound,
            ResourceKind::Common,
            RequestInput { args: vec![Value::from(arg)], ..Default::default() },
            0,
        )
    }

    #[test]
    fn unextractable_argument_is_skipped_not_blocked() {
        let registry = Arc::new(HotspotRegistry::new());
        let rule = HotspotRule::builder("svc.ep").threshold(1.0).build().unwrap();
        registry.install(rule, system_clock());
        let slot = HotspotSlot::new(registry);

        let ctx = EntryContext::new(
            "svc.ep",
            TrafficDirection::Inbound,
            ResourceKind::Common,
            RequestInput::default(),
            0,
        );
        assert!(slot.on_entry(&ctx).is_pass());
    }

    #[test]
    fn a_governed_argument_blocks_once_its_budget_is_spent() {
        let registry = Arc::new(HotspotRegistry::new());
        let rule = HotspotRule::builder("svc.ep").threshold(1.0).build().unwrap();
        registry.install(rule, system_clock());
        let slot = HotspotSlot::new(registry);

        assert!(slot.on_entry(&ctx_with_arg("svc.ep", "user-1")).is_pass());
        assert!(slot.on_entry(&ctx_with_arg("svc.ep", "user-1")).is_blocked());
        assert!(slot.on_entry(&ctx_with_arg("svc.ep", "user-2")).is_pass());
    }

    #[test]
    fn concurrency_permit_is_parked_on_the_context() {
        let registry = Arc::new(HotspotRegistry::new());
        let rule = HotspotRule::builder("svc.ep")
            .metric_type(MetricType::Concurrency)
            .threshold(1.0)
            .build()
            .unwrap();
        registry.install(rule, system_clock());
        let slot = HotspotSlot::new(registry);

        let first = ctx_with_arg("svc.ep", "user-1");
        assert!(slot.on_entry(&first).is_pass());
        assert!(slot.on_entry(&ctx_with_arg("svc.ep", "user-1")).is_blocked());
        drop(first);
        assert!(slot.on_entry(&ctx_with_arg("svc.ep", "user-1")).is_pass());
    }
}
