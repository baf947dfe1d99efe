//! Gray-traffic routing rules.

use sentinel_core::ConfigurationError;

/// One candidate target a weighted gray rule may route to.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayWeightEntry {
    pub weight: f64,
    pub target_resource: String,
    /// Optional version suffix, appended to `target_resource` as
    /// `"target_resource.target_version"` when present.
    pub target_version: Option<String>,
    /// The address list this target resolves to, opaque to the selector.
    pub effective_addresses: Option<String>,
}

impl GrayWeightEntry {
    pub fn new(weight: f64, target_resource: impl Into<String>) -> Self {
        Self {
            weight,
            target_resource: target_resource.into(),
            target_version: None,
            effective_addresses: None,
        }
    }

    pub fn with_target_version(mut self, version: impl Into<String>) -> Self {
        self.target_version = Some(version.into());
        self
    }

    pub fn with_effective_addresses(mut self, addresses: impl Into<String>) -> Self {
        self.effective_addresses = Some(addresses.into());
        self
    }

    /// The resolved target name a selector returns: `target_resource`, or
    /// `target_resource.target_version` when a version is set.
    pub fn resolved_resource(&self) -> String {
        match &self.target_version {
            Some(v) => format!("{}.{}", self.target_resource, v),
            None => self.target_resource.clone(),
        }
    }
}

/// A weighted gray-routing rule for one source resource.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayRule {
    pub(crate) resource: String,
    pub(crate) weight_list: Vec<GrayWeightEntry>,
    /// Whether an empty weight list should still force gray evaluation.
    /// Per §4.7, this is tracked for configuration fidelity but has no
    /// observable effect: an empty weight list always yields "no selector",
    /// matching the upstream behavior this engine was distilled from.
    pub(crate) force: bool,
}

impl GrayRule {
    pub fn builder(resource: impl Into<String>) -> GrayRuleBuilder {
        GrayRuleBuilder::new(resource)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn weight_list(&self) -> &[GrayWeightEntry] {
        &self.weight_list
    }

    pub fn force(&self) -> bool {
        self.force
    }
}

/// Builder for [`GrayRule`], validated on [`build`](Self::build).
pub struct GrayRuleBuilder {
    resource: String,
    weight_list: Vec<GrayWeightEntry>,
    force: bool,
}

impl GrayRuleBuilder {
    fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            weight_list: Vec::new(),
            force: false,
        }
    }

    pub fn weight_entry(mut self, entry: GrayWeightEntry) -> Self {
        self.weight_list.push(entry);
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn build(self) -> Result<GrayRule, ConfigurationError> {
        if self.resource.trim().is_empty() {
            return Err(ConfigurationError::EmptyResource);
        }
        for entry in &self.weight_list {
            if entry.weight <= 0.0 {
                return Err(ConfigurationError::Invalid {
                    resource: self.resource,
                    reason: format!(
                        "gray weight entry for {:?} has non-positive weight {}",
                        entry.target_resource, entry.weight
                    ),
                });
            }
        }
        Ok(GrayRule {
            resource: self.resource,
            weight_list: self.weight_list,
            force: self.force,
        })
    }
}
