//! Circuit breaker collaborator bound to a resource via the slot chain's
//! completion hook.
//!
//! The breaker state machine (`Closed` -> `Open` -> `HalfOpen`) lives in
//! [`circuit::Circuit`]; [`stat_slot::CircuitBreakerStatSlot`] is the
//! [`sentinel_core::Slot`] that feeds it from every completed entry.
//!
//! ```
//! use std::sync::Arc;
//! use sentinel_breaker::{BreakerRegistry, CircuitBreakerConfig, CircuitBreakerStatSlot};
//! use sentinel_breaker::circuit::Circuit;
//!
//! let registry = Arc::new(BreakerRegistry::new());
//! let breaker = Arc::new(Circuit::new(
//!     CircuitBreakerConfig::builder("order.create").build(),
//!     sentinel_core::clock::system_clock(),
//! ));
//! registry.bind("order.create", breaker);
//! let _slot = CircuitBreakerStatSlot::new(registry);
//! ```

pub mod circuit;
pub mod config;
pub mod event;
pub mod registry;
pub mod stat_slot;

pub use circuit::{Circuit, CircuitMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, SlidingWindowType};
pub use event::BreakerEvent;
pub use registry::BreakerRegistry;
pub use stat_slot::{CircuitBreakerStatSlot, STAT_SLOT_ORDER};
