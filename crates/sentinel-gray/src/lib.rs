//! Weighted gray-traffic routing: directs a subset of passing requests to
//! alternative target resources/addresses for controlled rollout.
//!
//! ```
//! use sentinel_gray::{GrayRegistry, GrayRule, GrayWeightEntry};
//!
//! let registry = GrayRegistry::new();
//! let rule = GrayRule::builder("order.create")
//!     .weight_entry(GrayWeightEntry::new(95.0, "order.create"))
//!     .weight_entry(GrayWeightEntry::new(5.0, "order.create").with_target_version("canary"))
//!     .build()
//!     .unwrap();
//! registry.update(&rule);
//! let choice = registry.choose("order.create");
//! ```

pub mod registry;
pub mod rule;
pub mod selector;

pub use registry::GrayRegistry;
pub use rule::{GrayRule, GrayRuleBuilder, GrayWeightEntry};
pub use selector::{GrayChoice, WeightedGraySelector};
