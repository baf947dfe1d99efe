//! The slot trait implemented by every stage of the governance chain.

use crate::context::EntryContext;
use crate::error::BlockError;
use crate::token::TokenResult;

/// A single stage of the decision pipeline, ordered by [`Slot::order`].
///
/// The throttling checker, each hotspot controller, and the circuit-breaker
/// stat slot all implement this trait; a `sentinel`-crate `SlotChain` walks
/// them in ascending order on every `Entry()`.
pub trait Slot: Send + Sync {
    /// Priority within the chain; lower runs first. Slots are sorted by this
    /// value once, when the chain is built (or rebuilt after a rule reload).
    fn order(&self) -> u32;

    /// One-time setup hook, called when the slot is installed into a chain.
    fn initial(&self) {}

    /// Called for every entry, in chain order, until one slot blocks or asks
    /// the caller to wait.
    fn on_entry(&self, ctx: &EntryContext) -> TokenResult;

    /// Called when an earlier slot (or this one) decided to block the entry;
    /// a no-op default, since most slots only care about completions.
    fn on_entry_blocked(&self, _ctx: &EntryContext, _block_error: &BlockError) {}

    /// Called once, from `Exit()`, after the response time and terminal error
    /// have been recorded on the context. The circuit-breaker stat slot is
    /// the canonical example: it does nothing on entry, everything here.
    fn on_completed(&self, _ctx: &EntryContext) {}
}
