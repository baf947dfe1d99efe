//! Configuration for a single circuit breaker, built with the same
//! validated-builder discipline every governance rule in this workspace uses.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::EventListeners;

use crate::event::BreakerEvent;

/// How the breaker's sliding window of recorded calls is bounded.
#[derive(Debug, Clone, Copy)]
pub enum SlidingWindowType {
    /// Keep the last `sliding_window_size` calls, regardless of when they happened.
    CountBased,
    /// Keep calls within the trailing `Duration`, regardless of how many there are.
    TimeBased(Duration),
}

/// Decides whether a completed call counts as a breaker failure, given the
/// stringly-typed terminal error an [`sentinel_core::EntryContext`] carries
/// (`None` meaning success).
pub type FailureClassifier = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// Validated configuration for one [`crate::circuit::Circuit`].
pub struct CircuitBreakerConfig {
    name: String,
    failure_rate_threshold: f64,
    slow_call_rate_threshold: f64,
    slow_call_duration_threshold: Duration,
    sliding_window_type: SlidingWindowType,
    sliding_window_size: u32,
    minimum_number_of_calls: u32,
    wait_duration_in_open: Duration,
    permitted_calls_in_half_open: u32,
    failure_classifier: FailureClassifier,
    events: EventListeners<BreakerEvent>,
}

impl CircuitBreakerConfig {
    pub fn builder(name: impl Into<String>) -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failure_rate_threshold(&self) -> f64 {
        self.failure_rate_threshold
    }

    pub fn slow_call_rate_threshold(&self) -> f64 {
        self.slow_call_rate_threshold
    }

    pub fn slow_call_duration_threshold(&self) -> Duration {
        self.slow_call_duration_threshold
    }

    pub fn sliding_window_type(&self) -> SlidingWindowType {
        self.sliding_window_type
    }

    pub fn sliding_window_size(&self) -> u32 {
        self.sliding_window_size
    }

    pub fn minimum_number_of_calls(&self) -> u32 {
        self.minimum_number_of_calls
    }

    pub fn wait_duration_in_open(&self) -> Duration {
        self.wait_duration_in_open
    }

    pub fn permitted_calls_in_half_open(&self) -> u32 {
        self.permitted_calls_in_half_open
    }

    pub fn is_failure(&self, error: Option<&str>) -> bool {
        (self.failure_classifier)(error)
    }

    pub fn events(&self) -> &EventListeners<BreakerEvent> {
        &self.events
    }
}

/// Builder for [`CircuitBreakerConfig`]. Defaults mirror the conservative
/// defaults this class of breaker has historically shipped with: trip at 50%
/// failures over a 100-call window, wait 30s before probing, and admit one
/// half-open probe at a time.
pub struct CircuitBreakerConfigBuilder {
    name: String,
    failure_rate_threshold: f64,
    slow_call_rate_threshold: f64,
    slow_call_duration_threshold: Duration,
    sliding_window_type: SlidingWindowType,
    sliding_window_size: u32,
    minimum_number_of_calls: u32,
    wait_duration_in_open: Duration,
    permitted_calls_in_half_open: u32,
    failure_classifier: Option<FailureClassifier>,
    events: EventListeners<BreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_rate_threshold: 0.5,
            slow_call_rate_threshold: 1.0,
            slow_call_duration_threshold: Duration::from_secs(60),
            sliding_window_type: SlidingWindowType::CountBased,
            sliding_window_size: 100,
            minimum_number_of_calls: 100,
            wait_duration_in_open: Duration::from_secs(30),
            permitted_calls_in_half_open: 1,
            failure_classifier: None,
            events: EventListeners::new(),
        }
    }

    pub fn failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.failure_rate_threshold = threshold;
        self
    }

    pub fn slow_call_rate_threshold(mut self, threshold: f64) -> Self {
        self.slow_call_rate_threshold = threshold;
        self
    }

    pub fn slow_call_duration_threshold(mut self, threshold: Duration) -> Self {
        self.slow_call_duration_threshold = threshold;
        self
    }

    pub fn sliding_window_count_based(mut self, size: u32) -> Self {
        self.sliding_window_type = SlidingWindowType::CountBased;
        self.sliding_window_size = size;
        self
    }

    pub fn sliding_window_time_based(mut self, window: Duration) -> Self {
        self.sliding_window_type = SlidingWindowType::TimeBased(window);
        self
    }

    /// Convenience form matching the teacher's count-based-by-default shape.
    pub fn sliding_window_size(mut self, size: u32) -> Self {
        self.sliding_window_size = size;
        self
    }

    pub fn minimum_number_of_calls(mut self, count: u32) -> Self {
        self.minimum_number_of_calls = count;
        self
    }

    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open = duration;
        self
    }

    pub fn permitted_calls_in_half_open(mut self, count: u32) -> Self {
        self.permitted_calls_in_half_open = count;
        self
    }

    /// Overrides the default "any terminal error is a failure" classifier.
    pub fn failure_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.failure_classifier = Some(Arc::new(classifier));
        self
    }

    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(&BreakerEvent) + Send + Sync + 'static,
    {
        self.events.add(sentinel_core::FnListener::new(f));
        self
    }

    /// Builds the config. Unlike the rule builders elsewhere in this
    /// workspace, a breaker's thresholds have no invalid combination worth
    /// rejecting at this layer — out-of-range rates simply never trip or
    /// always trip, which is an operational choice, not a configuration
    /// error.
    pub fn build(self) -> CircuitBreakerConfig {
        let failure_classifier = self
            .failure_classifier
            .unwrap_or_else(|| Arc::new(|error: Option<&str>| error.is_some()));
        CircuitBreakerConfig {
            name: self.name,
            failure_rate_threshold: self.failure_rate_threshold,
            slow_call_rate_threshold: self.slow_call_rate_threshold,
            slow_call_duration_threshold: self.slow_call_duration_threshold,
            sliding_window_type: self.sliding_window_type,
            sliding_window_size: self.sliding_window_size,
            minimum_number_of_calls: self.minimum_number_of_calls,
            wait_duration_in_open: self.wait_duration_in_open,
            permitted_calls_in_half_open: self.permitted_calls_in_half_open,
            failure_classifier,
            events: self.events,
        }
    }
}
