//! The outcome returned by every governance check.

use crate::error::BlockError;
use std::time::Duration;

/// The result of running a single check (throttling checker, a hotspot
/// controller, or the slot chain as a whole).
///
/// Controllers never propagate errors above themselves; this is the value
/// they return instead.
#[derive(Debug, Clone)]
pub enum TokenResult {
    /// The entry is permitted immediately.
    Pass,
    /// The entry is denied, with a typed cause.
    Blocked(BlockError),
    /// The caller should sleep for `duration` (on the virtual clock) and then
    /// proceed; no further slot execution happens for this decision.
    ShouldWait(Duration),
}

impl TokenResult {
    /// Returns `true` if this is a `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, TokenResult::Pass)
    }

    /// Returns `true` if this is a `Blocked`.
    pub fn is_blocked(&self) -> bool {
        matches!(self, TokenResult::Blocked(_))
    }

    /// Returns `true` if this is a `ShouldWait`.
    pub fn is_should_wait(&self) -> bool {
        matches!(self, TokenResult::ShouldWait(_))
    }

    /// The wait duration, if this is a `ShouldWait`.
    pub fn wait_duration(&self) -> Option<Duration> {
        match self {
            TokenResult::ShouldWait(d) => Some(*d),
            _ => None,
        }
    }

    /// The block error, if this is a `Blocked`.
    pub fn block_error(&self) -> Option<&BlockError> {
        match self {
            TokenResult::Blocked(e) => Some(e),
            _ => None,
        }
    }
}
