use std::sync::Arc;

use sentinel_core::{EntryContext, GrayState, Slot, TokenResult};
use sentinel_gray::GrayRegistry;

use super::GRAY_SLOT_ORDER;

/// Draws a gray-routing choice for an already-admitted entry and annotates
/// the context with it. Never blocks or waits — a resource with no installed
/// gray rule (or an empty weight list) is simply left unrouted.
pub struct GraySlot {
    registry: Arc<GrayRegistry>,
}

impl GraySlot {
    pub fn new(registry: Arc<GrayRegistry>) -> Self {
        Self { registry }
    }
}

impl Slot for GraySlot {
    fn order(&self) -> u32 {
        GRAY_SLOT_ORDER
    }

    fn on_entry(&self, ctx: &EntryContext) -> TokenResult {
        if let Some(choice) = self.registry.choose(ctx.resource()) {
            ctx.set_gray(GrayState {
                resource: Some(choice.resource.clone()),
                address_list: choice.effective_addresses,
                tag: Some(choice.resource),
                link_pass: true,
            });
        }
        TokenResult::Pass
    }
}
