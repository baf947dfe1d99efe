//! The slot chain driver: walks every registered [`Slot`] in ascending
//! `order()` on each entry, stopping at the first block or wait, and walks
//! all of them again on completion. The registered set lives behind an
//! [`ArcSwap`] so a rule reload can rebuild the chain without ever blocking
//! an in-flight `Entry()`/`Exit()` pair — readers hold the snapshot they
//! loaded for the whole call, not a lock.

use std::sync::Arc;

use arc_swap::ArcSwap;
use sentinel_core::{BlockError, EntryContext, Slot, TokenResult};

pub struct SlotChain {
    slots: ArcSwap<Vec<Arc<dyn Slot>>>,
}

impl SlotChain {
    /// Builds a chain from `slots`, sorting by [`Slot::order`] and running
    /// each slot's one-time `initial()` hook.
    pub fn new(slots: Vec<Arc<dyn Slot>>) -> Self {
        let chain = Self { slots: ArcSwap::from_pointee(Vec::new()) };
        chain.rebuild(slots);
        chain
    }

    /// Replaces the registered slot set atomically. In-flight entries that
    /// already loaded the prior snapshot finish against it unaffected.
    pub fn rebuild(&self, mut slots: Vec<Arc<dyn Slot>>) {
        slots.sort_by_key(|slot| slot.order());
        for slot in &slots {
            slot.initial();
        }
        self.slots.store(Arc::new(slots));
    }

    /// Walks the chain for a new entry, returning the first non-`Pass`
    /// decision it hits, or `Pass` if every slot passed.
    pub fn run_entry(&self, ctx: &EntryContext) -> TokenResult {
        let snapshot = self.slots.load();
        for slot in snapshot.iter() {
            match slot.on_entry(ctx) {
                TokenResult::Pass => continue,
                TokenResult::Blocked(err) => {
                    slot.on_entry_blocked(ctx, &err);
                    return TokenResult::Blocked(err);
                }
                wait @ TokenResult::ShouldWait(_) => return wait,
            }
        }
        TokenResult::Pass
    }

    /// Walks every slot's completion hook. Called once, from `Exit()`.
    pub fn run_completed(&self, ctx: &EntryContext) {
        let snapshot = self.slots.load();
        for slot in snapshot.iter() {
            slot.on_completed(ctx);
        }
    }
}

/// Convenience used by tests and by callers that want the `BlockError` out of
/// a chain result without matching on `TokenResult` themselves.
pub fn as_block_error(result: &TokenResult) -> Option<&BlockError> {
    result.block_error()
}
