//! Resource-level throttling: a lock-free virtual-queue leaky bucket.
//!
//! [`ThrottlingChecker`] enforces `threshold` operations per `interval_ms`
//! for one resource, with an optional bounded wait (`timeout_ms`) before
//! excess callers are blocked outright. All state lives in a single
//! `AtomicI64`; every check is a bounded compare-and-swap retry loop, never a
//! lock — see the module docs on [`checker`] for the exact algorithm.
//!
//! ```
//! use sentinel_flow::{ThrottlingChecker, ThrottlingRule};
//!
//! let rule = ThrottlingRule::builder("orders.create")
//!     .interval_ms(1000)
//!     .threshold(100.0)
//!     .timeout_ms(50)
//!     .build()
//!     .unwrap();
//! let checker = ThrottlingChecker::with_system_clock(rule);
//! let result = checker.check_one();
//! assert!(result.is_pass() || result.is_should_wait());
//! ```

pub mod checker;
pub mod rule;

#[cfg(feature = "layer")]
pub mod layer;

pub use checker::{shared_checker, ThrottlingChecker};
pub use rule::{ThrottlingRule, ThrottlingRuleBuilder};

#[cfg(feature = "layer")]
pub use layer::{ThrottlingLayer, ThrottlingService};
