//! The per-invocation context threaded through one governed call.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::value::Value;

/// Direction of the governed call relative to this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficDirection {
    /// This process is serving the call.
    Inbound,
    /// This process is issuing the call to a downstream.
    Outbound,
}

/// Coarse classification of the resource, used only for observability; the
/// governance algorithms themselves are resource-kind-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Common,
    Web,
    Rpc,
}

/// The request-shaped input an [`EntryContext`] carries, from which the
/// argument extractor (`sentinel-hotspot`) pulls hotspot keys.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    /// Positional call arguments, already coerced to [`Value`] at the
    /// boundary (no runtime reflection happens downstream of this point).
    pub args: Vec<Value>,
    /// Header map; a header may carry multiple values, first wins per §4.6.
    pub headers: HashMap<String, Vec<String>>,
    /// Metadata map (e.g. gRPC trailers/metadata), single-valued.
    pub metadata: HashMap<String, String>,
    /// Out-of-band attachments, checked first by the extractor.
    pub attachments: HashMap<String, String>,
    /// Opaque request body, not interpreted by the governance engine itself.
    pub body: Option<Vec<u8>>,
}

/// Mutable completion-time state, written once by `Exit()`.
#[derive(Debug, Default)]
struct Completion {
    response_time_ns: Option<i64>,
    error: Option<String>,
}

/// Gray-routing decision state, populated by the slot chain when a weighted
/// gray selector (in `sentinel-gray`) picks an alternate target for this entry.
#[derive(Debug, Default, Clone)]
pub struct GrayState {
    /// The resource this entry was rerouted to, if any.
    pub resource: Option<String>,
    /// The effective address list associated with the chosen resource.
    pub address_list: Option<String>,
    /// An opaque tag threaded downstream (e.g. into outbound headers) so a
    /// chain of services can stay on the same gray cohort.
    pub tag: Option<String>,
    /// When set, the gray tag should propagate to downstream calls made while
    /// handling this entry.
    pub link_pass: bool,
}

/// Per-invocation value created on entry to the slot chain, destroyed on exit.
/// Only the exit path updates completion metrics.
pub struct EntryContext {
    resource: String,
    traffic_direction: TrafficDirection,
    resource_kind: ResourceKind,
    input: RequestInput,
    start_ns: i64,
    completion: Mutex<Completion>,
    gray: Mutex<GrayState>,
    /// RAII guards (e.g. a hotspot concurrency permit) whose `Drop` must run
    /// no earlier than this context itself is dropped. Slots push into this
    /// instead of threading guard types through the chain's return values.
    guards: Mutex<Vec<Box<dyn Any + Send>>>,
}

impl EntryContext {
    /// Creates a new context at `start_ns` (virtual-clock nanoseconds).
    pub fn new(
        resource: impl Into<String>,
        traffic_direction: TrafficDirection,
        resource_kind: ResourceKind,
        input: RequestInput,
        start_ns: i64,
    ) -> Self {
        Self {
            resource: resource.into(),
            traffic_direction,
            resource_kind,
            input,
            start_ns,
            completion: Mutex::new(Completion::default()),
            gray: Mutex::new(GrayState::default()),
            guards: Mutex::new(Vec::new()),
        }
    }

    /// The governed resource name.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn traffic_direction(&self) -> TrafficDirection {
        self.traffic_direction
    }

    pub fn resource_kind(&self) -> ResourceKind {
        self.resource_kind
    }

    pub fn input(&self) -> &RequestInput {
        &self.input
    }

    pub fn start_ns(&self) -> i64 {
        self.start_ns
    }

    /// Records the completion outcome. Called exactly once, by `Exit()`.
    pub fn complete(&self, response_time_ns: i64, error: Option<String>) {
        let mut completion = self.completion.lock().unwrap();
        completion.response_time_ns = Some(response_time_ns);
        completion.error = error;
    }

    /// Response time recorded by `complete`, in nanoseconds.
    pub fn response_time_ns(&self) -> Option<i64> {
        self.completion.lock().unwrap().response_time_ns
    }

    /// Terminal error recorded by `complete`, if any.
    pub fn error(&self) -> Option<String> {
        self.completion.lock().unwrap().error.clone()
    }

    /// Installs a gray-routing decision for this entry.
    pub fn set_gray(&self, gray: GrayState) {
        *self.gray.lock().unwrap() = gray;
    }

    /// The gray target resource chosen for this entry, if any.
    pub fn gray_resource(&self) -> Option<String> {
        self.gray.lock().unwrap().resource.clone()
    }

    /// The gray target's effective address list, if any.
    pub fn gray_address(&self) -> Option<String> {
        self.gray.lock().unwrap().address_list.clone()
    }

    /// The gray tag, if any.
    pub fn gray_tag(&self) -> Option<String> {
        self.gray.lock().unwrap().tag.clone()
    }

    /// Whether the gray tag should propagate downstream.
    pub fn link_pass(&self) -> bool {
        self.gray.lock().unwrap().link_pass
    }

    /// Parks a RAII guard (e.g. a concurrency permit) so it is dropped no
    /// earlier than this context — and therefore no earlier than `Exit()`.
    pub fn push_guard<T: Any + Send + 'static>(&self, guard: T) {
        self.guards.lock().unwrap().push(Box::new(guard));
    }
}

impl std::fmt::Debug for EntryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryContext")
            .field("resource", &self.resource)
            .field("traffic_direction", &self.traffic_direction)
            .field("resource_kind", &self.resource_kind)
            .field("start_ns", &self.start_ns)
            .finish_non_exhaustive()
    }
}
