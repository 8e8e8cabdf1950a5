//! Experiment assignment store
//!
//! Per-experiment state machine: Unassigned -> Assigned, transitioned exactly
//! once by a weighted random draw on the first variant request. The assignment
//! is frozen in persisted storage until an explicit reset. Impression and
//! conversion counters accumulate alongside the assignment, and results carry
//! a coarse two-proportion z-test confidence estimate.
//!
//! All operations are total: malformed persisted state rebuilds empty, and a
//! conversion without an assignment is a no-op.

use crate::storage::KeyValueStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage key the experiment state persists under
pub const EXPERIMENT_STORE_KEY: &str = "readerpulse:experiments";

/// Impressions each variant needs before any non-zero confidence is reported
pub const MIN_IMPRESSIONS_FOR_CONFIDENCE: u64 = 100;

/// Counters for one variant of one experiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStats {
    pub impressions: u64,
    pub conversions: u64,
}

impl VariantStats {
    pub fn conversion_rate(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            self.conversions as f64 / self.impressions as f64
        }
    }
}

/// Aggregated results for one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    /// Counters and rate per variant
    pub variants: HashMap<String, VariantStats>,
    /// Variant with the strictly higher conversion rate, if any
    pub winner: Option<String>,
    /// Significance estimate, 0-99. Zero until both leading variants have
    /// enough impressions; the sub-threshold linear tail is a heuristic, not
    /// a validated test.
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ExperimentState {
    /// Frozen variant per experiment id
    assignments: HashMap<String, String>,
    /// Per-experiment, per-variant counters
    counters: HashMap<String, HashMap<String, VariantStats>>,
}

/// Persisted assignment and counter store for A/B/n experiments
pub struct ExperimentStore {
    state: ExperimentState,
    backend: Box<dyn KeyValueStore>,
    rng: StdRng,
}

impl ExperimentStore {
    /// Open the store, rehydrating persisted assignments and counters.
    ///
    /// Malformed or missing persisted state is rebuilt empty.
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        Self::open_with_rng(backend, StdRng::from_entropy())
    }

    /// Open with a fixed seed for deterministic assignment draws
    pub fn with_seed(backend: Box<dyn KeyValueStore>, seed: u64) -> Self {
        Self::open_with_rng(backend, StdRng::seed_from_u64(seed))
    }

    fn open_with_rng(backend: Box<dyn KeyValueStore>, rng: StdRng) -> Self {
        let state = match backend.get(EXPERIMENT_STORE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!("Malformed experiment state: {}; rebuilding empty", e);
                    ExperimentState::default()
                }
            },
            Ok(None) => ExperimentState::default(),
            Err(e) => {
                log::warn!("Could not read experiment state: {}", e);
                ExperimentState::default()
            }
        };
        Self {
            state,
            backend,
            rng,
        }
    }

    /// Return the variant this client is bound to, assigning one on first call.
    ///
    /// Every call records an impression for the assigned variant, the first
    /// included. `weights` drives the initial draw only; pass `None` for an
    /// even A/B split. Malformed weights fall back to an even split.
    pub fn variant(&mut self, experiment_id: &str, weights: Option<&[(String, f64)]>) -> String {
        let assigned = match self.state.assignments.get(experiment_id) {
            Some(variant) => variant.clone(),
            None => {
                let variant = self.draw(weights);
                self.state
                    .assignments
                    .insert(experiment_id.to_string(), variant.clone());
                variant
            }
        };

        self.counters_mut(experiment_id, &assigned).impressions += 1;
        self.persist();
        assigned
    }

    /// Current assignment without recording an impression
    pub fn assignment(&self, experiment_id: &str) -> Option<&str> {
        self.state
            .assignments
            .get(experiment_id)
            .map(String::as_str)
    }

    /// Record an extra impression for a variant, for render paths that
    /// display an already-known assignment without re-requesting it
    pub fn record_impression(&mut self, experiment_id: &str, variant: &str) {
        self.counters_mut(experiment_id, variant).impressions += 1;
        self.persist();
    }

    /// Record a conversion for the assigned variant.
    ///
    /// No assignment means no-op; a conversion never implicitly assigns.
    pub fn record_conversion(&mut self, experiment_id: &str) {
        let Some(variant) = self.state.assignments.get(experiment_id).cloned() else {
            return;
        };
        self.counters_mut(experiment_id, &variant).conversions += 1;
        self.persist();
    }

    /// Return the experiment to Unassigned and clear its counters
    pub fn reset(&mut self, experiment_id: &str) {
        self.state.assignments.remove(experiment_id);
        self.state.counters.remove(experiment_id);
        self.persist();
    }

    /// Per-variant stats, winner, and confidence estimate for an experiment
    pub fn results(&self, experiment_id: &str) -> ExperimentResults {
        let variants = self
            .state
            .counters
            .get(experiment_id)
            .cloned()
            .unwrap_or_default();

        // Compare the two variants with the most impressions
        let mut leading: Vec<(&String, &VariantStats)> = variants.iter().collect();
        leading.sort_by(|a, b| b.1.impressions.cmp(&a.1.impressions).then(a.0.cmp(b.0)));

        let (winner, confidence) = match (leading.first(), leading.get(1)) {
            (Some((name_a, a)), Some((name_b, b))) => {
                let winner = if a.conversion_rate() > b.conversion_rate() {
                    Some((*name_a).clone())
                } else if b.conversion_rate() > a.conversion_rate() {
                    Some((*name_b).clone())
                } else {
                    None
                };
                (winner, confidence_estimate(a, b))
            }
            _ => (None, 0.0),
        };

        ExperimentResults {
            variants,
            winner,
            confidence,
        }
    }

    fn counters_mut(&mut self, experiment_id: &str, variant: &str) -> &mut VariantStats {
        self.state
            .counters
            .entry(experiment_id.to_string())
            .or_default()
            .entry(variant.to_string())
            .or_default()
    }

    fn draw(&mut self, weights: Option<&[(String, f64)]>) -> String {
        let default_weights = [("A".to_string(), 50.0), ("B".to_string(), 50.0)];
        let mut weights = weights.unwrap_or(&default_weights).to_vec();
        if weights.is_empty() {
            weights = default_weights.to_vec();
        }

        // Malformed weights degrade to an even split over the named variants
        let malformed = weights.iter().any(|(_, w)| !w.is_finite() || *w < 0.0)
            || weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0;
        if malformed {
            log::warn!("Malformed experiment weights; falling back to even split");
            for (_, w) in &mut weights {
                *w = 1.0;
            }
        }

        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let roll = self.rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (variant, weight) in &weights {
            cumulative += weight;
            if roll < cumulative {
                return variant.clone();
            }
        }
        weights[weights.len() - 1].0.clone()
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.state) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to serialize experiment state: {}", e);
                return;
            }
        };
        if let Err(e) = self.backend.put(EXPERIMENT_STORE_KEY, &raw) {
            log::error!("Failed to persist experiment state: {}", e);
        }
    }
}

/// Two-proportion z-test approximation mapped to confidence buckets.
///
/// z >= 2.58 -> 99, z >= 1.96 -> 95, z >= 1.64 -> 90, else a linear scale
/// capped at 89. Reports 0 unless both variants carry at least
/// `MIN_IMPRESSIONS_FOR_CONFIDENCE` impressions, to avoid spurious early
/// signals.
fn confidence_estimate(a: &VariantStats, b: &VariantStats) -> f64 {
    if a.impressions < MIN_IMPRESSIONS_FOR_CONFIDENCE
        || b.impressions < MIN_IMPRESSIONS_FOR_CONFIDENCE
    {
        return 0.0;
    }

    let n1 = a.impressions as f64;
    let n2 = b.impressions as f64;
    let pooled = (a.conversions + b.conversions) as f64 / (n1 + n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se == 0.0 {
        return 0.0;
    }

    let z = (a.conversion_rate() - b.conversion_rate()).abs() / se;
    if z >= 2.58 {
        99.0
    } else if z >= 1.96 {
        95.0
    } else if z >= 1.64 {
        90.0
    } else {
        (z / 1.64 * 90.0).min(89.0)
    }
}
