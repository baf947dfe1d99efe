//! The circuit-breaker stat slot: bridges request completions into every
//! breaker bound to the entry's resource. Registered at chain order 5000.
//!
//! This slot deliberately does not gate entries itself — `on_entry` is a
//! no-op — mirroring the upstream design where breaker admission is a
//! separate check slot and this one only feeds the completion counters.
//! [`Circuit::try_acquire`](crate::circuit::Circuit::try_acquire) remains the
//! gating primitive an embedding application (or a future admission slot)
//! calls directly.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::{EntryContext, Slot, TokenResult};

use crate::registry::BreakerRegistry;

pub const STAT_SLOT_ORDER: u32 = 5000;

/// The slot-chain stage that drives every breaker bound to a resource from
/// that resource's completed entries.
pub struct CircuitBreakerStatSlot {
    registry: Arc<BreakerRegistry>,
}

impl CircuitBreakerStatSlot {
    pub fn new(registry: Arc<BreakerRegistry>) -> Self {
        Self { registry }
    }
}

impl Slot for CircuitBreakerStatSlot {
    fn order(&self) -> u32 {
        STAT_SLOT_ORDER
    }

    fn on_entry(&self, _ctx: &EntryContext) -> TokenResult {
        TokenResult::Pass
    }

    fn on_completed(&self, ctx: &EntryContext) {
        let rt = Duration::from_nanos(ctx.response_time_ns().unwrap_or(0).max(0) as u64);
        let error = ctx.error();
        for breaker in self.registry.for_resource(ctx.resource()) {
            breaker.on_request_complete(rt, error.as_deref());
        }
    }
}
