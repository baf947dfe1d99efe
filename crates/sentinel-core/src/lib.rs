//! Core infrastructure for the sentinel traffic-governance engine.
//!
//! This crate provides the pieces every pattern crate (`sentinel-flow`,
//! `sentinel-hotspot`, `sentinel-breaker`, `sentinel-gray`, and the `sentinel`
//! facade) shares:
//! - A mockable [`clock::Clock`] — every algorithm in this workspace reads
//!   time through it, never through `SystemTime`/`Instant` directly.
//! - A bounded, concurrent [`lru_map::BoundedLruMap`] of stable-address atomic
//!   cells, the foundation the hotspot controllers build their CAS-retry
//!   refill loops on.
//! - [`context::EntryContext`] and the [`slot::Slot`] trait the chain walks.
//! - [`token::TokenResult`] and the [`error`] types every component returns.
//! - An [`events`] system for observability, independent of the optional
//!   `tracing`/`metrics` feature gates.

pub mod clock;
pub mod context;
pub mod error;
pub mod events;
pub mod lru_map;
pub mod slot;
pub mod token;
pub mod value;
pub mod vqueue;

pub use clock::{Clock, MockClock, SharedClock, SystemClock};
pub use context::{EntryContext, GrayState, RequestInput, ResourceKind, TrafficDirection};
pub use error::{BlockError, BlockType, ConfigurationError, SentinelError, ShouldWait};
pub use events::{EventListener, EventListeners, FnListener, SentinelEvent};
pub use lru_map::{BoundedLruMap, Cell};
pub use slot::Slot;
pub use token::TokenResult;
pub use value::{ParamKind, Value};
pub use vqueue::VQueueOutcome;
