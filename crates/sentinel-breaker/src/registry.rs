//! Resource -> breaker bindings, the lookup table the stat slot consults.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::circuit::Circuit;

/// Maps a resource name to the (usually one, possibly several) breakers bound
/// to it. A resource with no bound breaker is simply ungoverned by this
/// pattern — the stat slot's `on_completed` is then a no-op for it.
#[derive(Default)]
pub struct BreakerRegistry {
    breakers: RwLock<HashMap<String, Vec<Arc<Circuit>>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `breaker` to `resource`. A resource may accumulate more than one
    /// bound breaker; all of them receive every completion.
    pub fn bind(&self, resource: impl Into<String>, breaker: Arc<Circuit>) {
        self.breakers.write().entry(resource.into()).or_default().push(breaker);
    }

    /// Removes every breaker bound to `resource`.
    pub fn unbind(&self, resource: &str) {
        self.breakers.write().remove(resource);
    }

    /// Breakers bound to `resource`, if any.
    pub fn for_resource(&self, resource: &str) -> Vec<Arc<Circuit>> {
        self.breakers
            .read()
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }
}
