//! The weighted gray-traffic selector: a bucket-based sampler over a gray
//! rule's candidate targets, per §4.7 of the governance spec.

use rand::Rng;

use crate::rule::{GrayRule, GrayWeightEntry};

/// A chosen gray target: the resolved resource name and its opaque address
/// list, if the winning entry carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayChoice {
    pub resource: String,
    pub effective_addresses: Option<String>,
}

/// Immutable weighted selector built from one [`GrayRule`]. Rule updates are
/// applied by building a fresh selector and atomically swapping it in at the
/// registry that holds it (an `arc_swap::ArcSwapOption`) — this type itself
/// never mutates once constructed, so no lock is needed on the read path.
pub struct WeightedGraySelector {
    entries: Vec<GrayWeightEntry>,
    cumulative_weights: Vec<f64>,
    total_weight: f64,
}

impl WeightedGraySelector {
    /// Builds a selector from `rule`. Returns `None` if the rule's weight
    /// list is empty — per §4.7, this holds regardless of `rule.force()`,
    /// matching the upstream behavior the dead `force=false` fallback branch
    /// never actually reaches.
    pub fn from_rule(rule: &GrayRule) -> Option<Self> {
        if rule.weight_list().is_empty() {
            return None;
        }

        let mut cumulative_weights = Vec::with_capacity(rule.weight_list().len());
        let mut sum = 0.0;
        for entry in rule.weight_list() {
            sum += entry.weight;
            cumulative_weights.push(sum);
        }

        Some(Self {
            entries: rule.weight_list().to_vec(),
            cumulative_weights,
            total_weight: sum,
        })
    }

    /// Draws one candidate, weighted by its configured share of
    /// `total_weight`. Not required to be deterministic or consistent across
    /// calls — this is a sampler, not a consistent-hash router.
    pub fn choose(&self) -> GrayChoice {
        self.choose_with_rng(&mut rand::rng())
    }

    fn choose_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> GrayChoice {
        let draw = rng.random_range(0.0..self.total_weight);
        let index = self
            .cumulative_weights
            .partition_point(|&cum| cum <= draw)
            .min(self.entries.len() - 1);
        let entry = &self.entries[index];
        GrayChoice {
            resource: entry.resolved_resource(),
            effective_addresses: entry.effective_addresses.clone(),
        }
    }
}
