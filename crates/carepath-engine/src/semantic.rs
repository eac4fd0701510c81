//! Translational-embedding path scoring.
//!
//! Each edge (h, r, t) contributes the residual `h + r − t`; residuals
//! compose additively along a path and the path's energy is the negative
//! Euclidean norm of the accumulated residual. A path that is consistent
//! with the embedding model has a small residual and therefore a high
//! (close-to-zero) energy.
//!
//! Per doctor, raw energies become a softmax weight distribution over that
//! doctor's paths (max-subtracted before exponentiation, so no overflow);
//! the scalar carried into ranking is the top weight scaled by a sigmoid of
//! the best raw energy, bounded to [0, 1].

use crate::config::{EngineConfig, MissingEmbeddingPolicy};
use crate::paths::Path;
use carepath_graph::{EmbeddingError, EmbeddingTable, KnowledgeGraph};

/// A path with its raw energy and per-doctor softmax weight.
#[derive(Debug, Clone)]
pub struct ScoredPath {
    pub path: Path,
    pub energy: f64,
    pub weight: f64,
}

/// Semantic summary of one doctor's retrieved paths.
#[derive(Debug, Clone)]
pub struct DoctorSemantics {
    /// Scalar relevance in [0, 1] used by the ranker.
    pub relevance: f64,
    /// Full weight distribution, descending by weight.
    pub paths: Vec<ScoredPath>,
}

/// Raw energy of a path: `−‖Σ_edges (h + r − t)‖₂`.
pub fn path_energy(
    graph: &KnowledgeGraph,
    table: &EmbeddingTable,
    path: &Path,
) -> Result<f64, EmbeddingError> {
    let dim = table.dim();
    let mut residual = vec![0.0f64; dim];
    for &edge_id in path.edge_ids() {
        let edge = graph.edge(edge_id);
        let h = table.entity(graph, edge.source)?;
        let r = table.relation(edge.relation)?;
        let t = table.entity(graph, edge.target)?;
        for i in 0..dim {
            residual[i] += f64::from(h[i]) + f64::from(r[i]) - f64::from(t[i]);
        }
    }
    let norm = residual.iter().map(|x| x * x).sum::<f64>().sqrt();
    Ok(-norm)
}

/// Softmax over raw energies with temperature, stabilized by subtracting the
/// maximum. A single energy yields weight exactly 1; a degenerate sum falls
/// back to the uniform distribution.
pub fn softmax_weights(energies: &[f64], temperature: f64) -> Vec<f64> {
    if energies.is_empty() {
        return Vec::new();
    }
    if energies.len() == 1 {
        return vec![1.0];
    }

    let temperature = if temperature > 0.0 { temperature } else { 1.0 };
    let max = energies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = energies
        .iter()
        .map(|&e| ((e - max) / temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();

    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|x| x / sum).collect()
    } else {
        vec![1.0 / energies.len() as f64; energies.len()]
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Scalar relevance of a doctor from its best path's weight and raw energy.
///
/// The exact aggregation of the per-path distribution into one scalar is the
/// least settled part of the model; keep every revision confined to this
/// function.
pub fn doctor_relevance(best_weight: f64, best_energy: f64) -> f64 {
    (best_weight * sigmoid(best_energy)).clamp(0.0, 1.0)
}

/// Score one doctor's paths under the configured missing-embedding policy.
///
/// Returns `Ok(None)` when every path was skipped — the doctor is no longer
/// a candidate.
pub fn score_doctor_paths(
    graph: &KnowledgeGraph,
    table: &EmbeddingTable,
    paths: Vec<Path>,
    config: &EngineConfig,
) -> Result<Option<DoctorSemantics>, EmbeddingError> {
    let mut kept: Vec<(Path, f64)> = Vec::with_capacity(paths.len());
    for path in paths {
        match path_energy(graph, table, &path) {
            Ok(energy) => kept.push((path, energy)),
            Err(err) => match config.missing_embeddings {
                MissingEmbeddingPolicy::SkipPath => {
                    tracing::warn!(error = %err, "skipping path without embeddings");
                }
                MissingEmbeddingPolicy::FailQuery => return Err(err),
            },
        }
    }

    if kept.is_empty() {
        return Ok(None);
    }

    let energies: Vec<f64> = kept.iter().map(|(_, e)| *e).collect();
    let weights = softmax_weights(&energies, config.temperature);

    let mut scored: Vec<ScoredPath> = kept
        .into_iter()
        .zip(weights)
        .map(|((path, energy), weight)| ScoredPath {
            path,
            energy,
            weight,
        })
        .collect();

    // Deterministic order: weight desc, then shorter path, then node chain.
    scored.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.path.len().cmp(&b.path.len()))
            .then_with(|| a.path.nodes().cmp(b.path.nodes()))
    });

    let best = &scored[0];
    let relevance = doctor_relevance(best.weight, best.energy);

    Ok(Some(DoctorSemantics {
        relevance,
        paths: scored,
    }))
}
