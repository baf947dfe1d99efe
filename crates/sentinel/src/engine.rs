//! The `Entry`/`Exit` facade: the single entry point an embedding
//! application calls to run a request through the whole governance chain,
//! and the handle it gets back to report completion with.

use std::sync::Arc;
use std::time::Duration;

use sentinel_breaker::BreakerRegistry;
use sentinel_core::{BlockError, EntryContext, RequestInput, ResourceKind, SharedClock, TokenResult, TrafficDirection};
use sentinel_gray::GrayRegistry;

use crate::chain::SlotChain;
use crate::registry::{HotspotRegistry, ThrottlingRegistry};
use crate::slots::{GraySlot, HotspotSlot, ThrottlingSlot};

/// The engine's decision on `Entry()`: either the entry passes immediately,
/// or a slot asked the caller to wait `Duration` before proceeding. Either
/// way the entry is admitted — `ShouldWait` stops the chain rather than
/// retrying it, per the governance spec's virtual-queue semantics — and the
/// returned [`EntryHandle`] must be exited exactly once.
pub enum EntryDecision {
    Pass(EntryHandle),
    Wait(EntryHandle, Duration),
}

impl EntryDecision {
    /// Consumes the decision, returning the handle regardless of variant.
    /// The caller is responsible for having slept `wait_duration()` (if any)
    /// before doing the governed work this handle represents.
    pub fn into_handle(self) -> EntryHandle {
        match self {
            EntryDecision::Pass(handle) => handle,
            EntryDecision::Wait(handle, _) => handle,
        }
    }

    pub fn wait_duration(&self) -> Option<Duration> {
        match self {
            EntryDecision::Pass(_) => None,
            EntryDecision::Wait(_, duration) => Some(*duration),
        }
    }
}

/// A handle to one admitted entry, returned by [`SentinelEngine::entry`].
/// Must be consumed by [`EntryHandle::exit`] exactly once, mirroring the
/// upstream `Entry()`/`Exit()` call pairing this engine's API is modeled on.
pub struct EntryHandle {
    ctx: Arc<EntryContext>,
    chain: Arc<SlotChain>,
    clock: SharedClock,
}

impl EntryHandle {
    fn new(ctx: Arc<EntryContext>, chain: Arc<SlotChain>, clock: SharedClock) -> Self {
        Self { ctx, chain, clock }
    }

    pub fn resource(&self) -> &str {
        self.ctx.resource()
    }

    /// The gray target this entry was rerouted to, if the chain's gray slot
    /// selected one.
    pub fn gray_resource(&self) -> Option<String> {
        self.ctx.gray_resource()
    }

    pub fn gray_address(&self) -> Option<String> {
        self.ctx.gray_address()
    }

    pub fn gray_tag(&self) -> Option<String> {
        self.ctx.gray_tag()
    }

    pub fn link_pass(&self) -> bool {
        self.ctx.link_pass()
    }

    /// Records completion and runs every slot's `on_completed` hook (notably
    /// the circuit-breaker stat slot). `error` is a terminal error message,
    /// `None` on success.
    pub fn exit(self, error: Option<String>) {
        let now = self.clock.current_time_nanos();
        let response_time_ns = (now - self.ctx.start_ns()).max(0);
        self.ctx.complete(response_time_ns, error);
        self.chain.run_completed(&self.ctx);
    }
}

/// The composed traffic-governance engine: one resource throttling registry,
/// one hotspot registry, one breaker registry, one gray registry, and the
/// slot chain that ties them together in the order the governance spec
/// prescribes (throttling, then hotspot, then gray selection, then the
/// breaker's completion bridge).
pub struct SentinelEngine {
    clock: SharedClock,
    chain: Arc<SlotChain>,
    throttling: Arc<ThrottlingRegistry>,
    hotspot: Arc<HotspotRegistry>,
    breaker: Arc<BreakerRegistry>,
    gray: Arc<GrayRegistry>,
}

impl SentinelEngine {
    /// Builds an engine backed by the real system clock.
    pub fn new() -> Self {
        Self::with_clock(sentinel_core::clock::system_clock())
    }

    /// Builds an engine backed by `clock`, so tests can drive every
    /// governance component deterministically with a single
    /// [`sentinel_core::clock::MockClock`].
    pub fn with_clock(clock: SharedClock) -> Self {
        let throttling = Arc::new(ThrottlingRegistry::new());
        let hotspot = Arc::new(HotspotRegistry::new());
        let breaker = Arc::new(BreakerRegistry::new());
        let gray = Arc::new(GrayRegistry::new());

        let chain = Arc::new(SlotChain::new(vec![
            Arc::new(ThrottlingSlot::new(Arc::clone(&throttling))),
            Arc::new(HotspotSlot::new(Arc::clone(&hotspot))),
            Arc::new(GraySlot::new(Arc::clone(&gray))),
            Arc::new(sentinel_breaker::CircuitBreakerStatSlot::new(Arc::clone(&breaker))),
        ]));

        Self { clock, chain, throttling, hotspot, breaker, gray }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn throttling(&self) -> &Arc<ThrottlingRegistry> {
        &self.throttling
    }

    pub fn hotspot(&self) -> &Arc<HotspotRegistry> {
        &self.hotspot
    }

    pub fn breaker(&self) -> &Arc<BreakerRegistry> {
        &self.breaker
    }

    pub fn gray(&self) -> &Arc<GrayRegistry> {
        &self.gray
    }

    /// Runs `input` through the whole governance chain for `resource`.
    /// Returns a handle on `Pass`/`ShouldWait`, or the blocking
    /// [`BlockError`] if some slot rejected the entry outright.
    pub fn entry(
        &self,
        resource: impl Into<String>,
        traffic_direction: TrafficDirection,
        resource_kind: ResourceKind,
        input: RequestInput,
    ) -> Result<EntryDecision, BlockError> {
        let start_ns = self.clock.current_time_nanos();
        let ctx = Arc::new(EntryContext::new(resource, traffic_direction, resource_kind, input, start_ns));

        match self.chain.run_entry(&ctx) {
            TokenResult::Pass => {
                Ok(EntryDecision::Pass(EntryHandle::new(ctx, Arc::clone(&self.chain), Arc::clone(&self.clock))))
            }
            TokenResult::ShouldWait(duration) => Ok(EntryDecision::Wait(
                EntryHandle::new(ctx, Arc::clone(&self.chain), Arc::clone(&self.clock)),
                duration,
            )),
            TokenResult::Blocked(err) => Err(err),
        }
    }

    /// Convenience form for an inbound call with no structured input beyond
    /// the resource name.
    pub fn entry_simple(&self, resource: impl Into<String>) -> Result<EntryDecision, BlockError> {
        self.entry(resource, TrafficDirection::Inbound, ResourceKind::Common, RequestInput::default())
    }
}

impl Default for SentinelEngine {
    fn default() -> Self {
        Self::new()
    }
}
