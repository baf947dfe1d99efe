use sentinel_core::ConfigurationError;

/// Configuration for a resource-level throttling checker: a leaky bucket
/// enforcing `threshold` operations per `interval_ms`, with an optional
/// maximum queueing time.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottlingRule {
    pub(crate) resource: String,
    pub(crate) interval_ms: u32,
    pub(crate) threshold: f64,
    pub(crate) timeout_ms: u32,
}

impl ThrottlingRule {
    /// Creates a new builder.
    pub fn builder(resource: impl Into<String>) -> ThrottlingRuleBuilder {
        ThrottlingRuleBuilder::new(resource)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

/// Builder for [`ThrottlingRule`], validated on [`build`](Self::build).
pub struct ThrottlingRuleBuilder {
    resource: String,
    interval_ms: u32,
    threshold: f64,
    timeout_ms: u32,
}

impl ThrottlingRuleBuilder {
    fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            interval_ms: 1000,
            threshold: 0.0,
            timeout_ms: 0,
        }
    }

    /// The interval, in milliseconds, over which `threshold` permits are
    /// granted. Default: 1000 (one second).
    pub fn interval_ms(mut self, interval_ms: u32) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Permits per interval. Must be strictly positive; validated in `build`.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Maximum time, in milliseconds, a caller may be asked to wait before
    /// the checker blocks instead of queueing. `0` means no queueing at all:
    /// any call that would not pass immediately is blocked.
    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Validates and constructs the rule.
    pub fn build(self) -> Result<ThrottlingRule, ConfigurationError> {
        if self.resource.trim().is_empty() {
            return Err(ConfigurationError::EmptyResource);
        }
        if self.threshold <= 0.0 {
            return Err(ConfigurationError::NonPositiveThreshold {
                resource: self.resource,
                threshold: self.threshold,
            });
        }
        Ok(ThrottlingRule {
            resource: self.resource,
            interval_ms: self.interval_ms,
            threshold: self.threshold,
            timeout_ms: self.timeout_ms,
        })
    }
}
