//! Error types for the traffic-governance engine.
//!
//! Controllers never propagate errors above themselves — they produce a
//! [`crate::token::TokenResult`]. Only the slot chain surfaces a [`BlockError`]
//! to the caller, and only rule installation can fail with a
//! [`ConfigurationError`]. Both compose into [`SentinelError<E>`] the same way
//! this workspace's other resilience layers compose into a unified error type,
//! so an embedding service can use one error type across every governed call.

use std::fmt;
use std::time::Duration;

/// The reason a slot decided to block an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// Resource-level throttling checker rejected the call.
    Flow,
    /// A hotspot (per-parameter) controller rejected the call.
    HotSpotParamFlow,
    /// A bound circuit breaker is open.
    CircuitBreaking,
    /// An internal/system condition caused rejection (fail-closed path, if ever enabled).
    System,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockType::Flow => "flow",
            BlockType::HotSpotParamFlow => "hotspot_param_flow",
            BlockType::CircuitBreaking => "circuit_breaking",
            BlockType::System => "system",
        };
        write!(f, "{s}")
    }
}

/// A policy decision to deny an entry, carrying the cause and the value that
/// triggered it. Not a bug and not logged at error level — this is the engine
/// working as designed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("blocked by {block_type} on resource {resource:?}: {message}")]
pub struct BlockError {
    /// The typed cause of the block.
    pub block_type: BlockType,
    /// The resource the blocked entry targeted.
    pub resource: String,
    /// Human-readable explanation, safe to surface to operators.
    pub message: String,
    /// The argument value that tripped the controller, if the block came from
    /// a keyed (hotspot) controller.
    pub triggered_value: Option<String>,
}

impl BlockError {
    /// Constructs a new block error.
    pub fn new(block_type: BlockType, resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            block_type,
            resource: resource.into(),
            message: message.into(),
            triggered_value: None,
        }
    }

    /// Attaches the triggering value (the hotspot argument, typically).
    pub fn with_triggered_value(mut self, value: impl Into<String>) -> Self {
        self.triggered_value = Some(value.into());
        self
    }
}

/// A rule rejected at install time. Active rules are unaffected — a rejected
/// batch never partially replaces the live rule set.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
    /// `threshold` must be strictly positive.
    #[error("rule for resource {resource:?} has non-positive threshold {threshold}")]
    NonPositiveThreshold { resource: String, threshold: f64 },

    /// The resource name was empty.
    #[error("rule has an empty resource name")]
    EmptyResource,

    /// The rule named a metric type this engine does not support.
    #[error("rule for resource {resource:?} has an unsupported metric type")]
    UnsupportedMetricType { resource: String },

    /// A free-form validation failure that doesn't fit the variants above.
    #[error("invalid rule for resource {resource:?}: {reason}")]
    Invalid { resource: String, reason: String },
}

/// Unified error type across every governance component, so an embedding
/// service can compose the throttling checker, hotspot controllers, and
/// circuit breaker bridge behind one application error type with zero
/// boilerplate `From` impls at the call site.
#[derive(Debug, Clone)]
pub enum SentinelError<E> {
    /// A slot in the chain blocked the entry.
    Block(BlockError),
    /// A rule failed validation at install time.
    Configuration(ConfigurationError),
    /// The wrapped service's own error.
    Application(E),
}

impl<E> From<BlockError> for SentinelError<E> {
    fn from(e: BlockError) -> Self {
        SentinelError::Block(e)
    }
}

impl<E> From<ConfigurationError> for SentinelError<E> {
    fn from(e: ConfigurationError) -> Self {
        SentinelError::Configuration(e)
    }
}

impl<E: fmt::Display> fmt::Display for SentinelError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentinelError::Block(e) => write!(f, "{e}"),
            SentinelError::Configuration(e) => write!(f, "{e}"),
            SentinelError::Application(e) => write!(f, "application error: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for SentinelError<E> {}

impl<E> SentinelError<E> {
    /// Returns `true` if this is a block decision.
    pub fn is_blocked(&self) -> bool {
        matches!(self, SentinelError::Block(_))
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SentinelError::Configuration(_))
    }

    /// Returns `true` if this is an application error.
    pub fn is_application(&self) -> bool {
        matches!(self, SentinelError::Application(_))
    }

    /// Extracts the application error, if this is an `Application` variant.
    pub fn application_error(self) -> Option<E> {
        match self {
            SentinelError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the application error using a function.
    pub fn map_application<F, T>(self, f: F) -> SentinelError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            SentinelError::Block(e) => SentinelError::Block(e),
            SentinelError::Configuration(e) => SentinelError::Configuration(e),
            SentinelError::Application(e) => SentinelError::Application(f(e)),
        }
    }
}

/// A non-error outcome used by async `tower::Service` wrappers when a slot
/// asks the caller to wait rather than pass or block immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShouldWait {
    /// How long the caller should sleep before the entry is implicitly granted.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestError;

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test error")
        }
    }

    impl std::error::Error for TestError {}

    #[test]
    fn block_error_carries_triggered_value() {
        let err = BlockError::new(BlockType::HotSpotParamFlow, "svc.ep", "too many requests")
            .with_triggered_value("user-42");
        assert_eq!(err.triggered_value.as_deref(), Some("user-42"));
        assert!(err.to_string().contains("hotspot_param_flow"));
    }

    #[test]
    fn sentinel_error_from_block_error() {
        let err: SentinelError<TestError> =
            BlockError::new(BlockType::Flow, "svc", "over threshold").into();
        assert!(err.is_blocked());
        assert!(!err.is_application());
    }

    #[test]
    fn map_application_preserves_block_variant() {
        let err: SentinelError<TestError> = BlockError::new(BlockType::Flow, "svc", "x").into();
        let mapped: SentinelError<String> = err.map_application(|e| e.to_string());
        assert!(mapped.is_blocked());
    }

    const _: () = {
        const fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<SentinelError<TestError>>();
    };
}
