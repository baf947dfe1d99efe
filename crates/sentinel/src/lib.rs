//! The composed traffic-governance engine.
//!
//! Each governance concern in this workspace ships as its own crate —
//! resource-level throttling (`sentinel-flow`), per-argument hotspot shaping
//! (`sentinel-hotspot`), circuit breaking (`sentinel-breaker`), weighted gray
//! routing (`sentinel-gray`) — built on the shared primitives in
//! `sentinel-core` (the virtual [`clock`](sentinel_core::clock), the
//! [`EntryContext`](sentinel_core::EntryContext), the [`Slot`](sentinel_core::Slot)
//! trait). This crate is the facade that wires all four into one ordered
//! [`chain::SlotChain`] behind a single `Entry()`/`Exit()` API
//! ([`engine::SentinelEngine`]), the way an embedding service actually wants
//! to call it: one resource name in, one governed call out.
//!
//! ```
//! use sentinel::SentinelEngine;
//!
//! let engine = SentinelEngine::new();
//! match engine.entry_simple("orders.create") {
//!     Ok(decision) => {
//!         let handle = decision.into_handle();
//!         // ... do the governed work ...
//!         handle.exit(None);
//!     }
//!     Err(block_error) => {
//!         // rejected by some slot in the chain
//!         let _ = block_error;
//!     }
//! }
//! ```
//!
//! Slots run in a fixed order on every entry — resource throttling first,
//! then per-argument hotspot shaping, then gray-routing selection, then
//! (on completion only) the circuit-breaker stat bridge — and the chain
//! stops at the first `Block` or `ShouldWait` it hits; see
//! [`slots`] for the order constants and each slot's own docs.
//!
//! Enable the `layer` feature for [`layer::SentinelLayer`], a `tower::Layer`
//! that runs the whole chain around an existing `tower::Service`.

pub mod chain;
pub mod engine;
#[cfg(feature = "layer")]
pub mod layer;
pub mod registry;
mod request_view;
pub mod slots;

pub use chain::SlotChain;
pub use engine::{EntryDecision, EntryHandle, SentinelEngine};
#[cfg(feature = "layer")]
pub use layer::{SentinelLayer, SentinelService};
pub use registry::{HotspotEntry, HotspotRegistry, ThrottlingRegistry};

pub use sentinel_breaker::{BreakerRegistry, Circuit, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitMetrics, CircuitState};
pub use sentinel_core::{
    BlockError, BlockType, Clock, ConfigurationError, EntryContext, GrayState, RequestInput,
    ResourceKind, SentinelError, SharedClock, TokenResult, TrafficDirection, Value,
};
pub use sentinel_gray::{GrayChoice, GrayRegistry, GrayRule, GrayRuleBuilder, GrayWeightEntry, WeightedGraySelector};
pub use sentinel_hotspot::{ControlBehavior, HotspotRule, HotspotRuleBuilder, MetricType, ParamSource};
pub use sentinel_flow::{ThrottlingChecker, ThrottlingRule, ThrottlingRuleBuilder};

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::clock::MockClock;
    use std::sync::Arc;

    #[test]
    fn end_to_end_chain_composes_all_four_patterns() {
        let clock: SharedClock = Arc::new(MockClock::new());
        let engine = SentinelEngine::with_clock(Arc::clone(&clock));

        let throttling_rule = ThrottlingRule::builder("orders.create").threshold(2.0).build().unwrap();
        engine.throttling().install(throttling_rule, Arc::clone(&clock));

        let hotspot_rule = HotspotRule::builder("orders.create").threshold(1.0).build().unwrap();
        engine.hotspot().install(hotspot_rule, Arc::clone(&clock));

        let gray_rule = GrayRule::builder("orders.create")
            .weight_entry(GrayWeightEntry::new(1.0, "orders.create.canary"))
            .build()
            .unwrap();
        engine.gray().update(&gray_rule);

        let breaker = Arc::new(Circuit::new(CircuitBreakerConfig::builder("orders.create").build(), Arc::clone(&clock)));
        engine.breaker().bind("orders.create", Arc::clone(&breaker));

        let handle = engine.entry_simple("orders.create").unwrap().into_handle();
        assert_eq!(handle.gray_resource().as_deref(), Some("orders.create.canary"));
        handle.exit(None);

        assert_eq!(breaker.metrics().total_count, 1);
    }
}
