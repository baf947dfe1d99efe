//! Per-argument ("hotspot") traffic governance: rate- and concurrency-limit
//! traffic keyed by a value extracted from each individual request, rather
//! than by resource as a whole.
//!
//! ```
//! use sentinel_core::Value;
//! use sentinel_hotspot::{HotspotRejectController, HotspotRule};
//!
//! let rule = HotspotRule::builder("order.create")
//!     .threshold(10.0)
//!     .burst_count(5)
//!     .duration_sec(1)
//!     .specific_item("vip-customer", 100.0)
//!     .build()
//!     .unwrap();
//! let controller = HotspotRejectController::with_system_clock(rule);
//! let _ = controller.perform(&Value::from("user-42"), 1);
//! ```

pub mod concurrency;
pub mod extractor;
pub mod metric;
pub mod reject;
pub mod rule;
pub mod throttling;

pub use concurrency::{ConcurrencyPermit, HotspotConcurrencyController};
pub use extractor::{extract, ExtractableRequest};
pub use metric::ParamsMetric;
pub use reject::HotspotRejectController;
pub use rule::{ControlBehavior, HotspotRule, HotspotRuleBuilder, MetricType, ParamSource};
pub use throttling::HotspotThrottlingController;
