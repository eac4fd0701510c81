//! Engine configuration surface.

use serde::{Deserialize, Serialize};

/// How per-dimension satisfaction scores combine into Ψ.
///
/// Insurance is a veto in both modes: an unmet insurance requirement zeroes
/// Ψ regardless of the other dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CombineMode {
    /// Ψ = ψ_cost · ψ_geo · ψ_ins.
    Product,
    /// Ψ = ψ_ins · (w_cost·ψ_cost + w_geo·ψ_geo) / (w_cost + w_geo).
    WeightedSum { cost: f64, geo: f64 },
}

/// Shape of the soft decay applied to over-budget fees and far locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayProfile {
    /// Linear ramps: `1 − (fee−budget)/budget`, `1 − d/maxDistance`,
    /// floored at 0.
    Linear,
    /// Sigmoid cost decay and Gaussian distance decay.
    Smooth,
}

/// What to do when a path references an entity or relation without an
/// embedding vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEmbeddingPolicy {
    /// Log and drop the offending path; keep the doctor's remaining paths.
    /// Partial results are preferred over total failure.
    SkipPath,
    /// Fail the whole query.
    FailQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum path length in edges.
    pub max_hops: usize,
    /// Softmax temperature for per-doctor path weights.
    pub temperature: f64,
    pub combine: CombineMode,
    pub decay: DecayProfile,
    pub missing_embeddings: MissingEmbeddingPolicy,
    /// Keep doctors whose final score is zero (ranked last).
    pub include_unsatisfied: bool,
    /// Truncate the ranked result to this many doctors.
    pub top_k: Option<usize>,
    /// Cap on candidate doctors scored per query, applied deterministically
    /// (ascending entity id) before scoring. Guards against pathological
    /// branching together with `max_hops`.
    pub max_candidates: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_hops: 4,
            temperature: 1.0,
            combine: CombineMode::Product,
            decay: DecayProfile::Linear,
            missing_embeddings: MissingEmbeddingPolicy::SkipPath,
            include_unsatisfied: true,
            top_k: None,
            max_candidates: None,
        }
    }
}
