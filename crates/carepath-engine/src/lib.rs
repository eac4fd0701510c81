//! Multi-constraint path reasoning over the carepath knowledge graph.
//!
//! A query is a set of symptom entities plus optional socio-economic
//! constraints. The engine enumerates bounded simple paths to doctors,
//! scores each path with the translational embedding model, evaluates
//! constraint satisfaction Ψ per doctor, and combines both into a ranked,
//! explainable recommendation:
//!
//! ```text
//! finalScore(doctor) = Ψ(doctor, constraints) · relevance(doctor)
//! ```
//!
//! Every step is a pure function over the immutable graph snapshot and the
//! query, so per-doctor scoring fans out on rayon without synchronization
//! and repeated queries are bit-identical.

pub mod config;
pub mod constraints;
pub mod explain;
pub mod paths;
pub mod rank;
pub mod semantic;

pub use config::{CombineMode, DecayProfile, EngineConfig, MissingEmbeddingPolicy};
pub use constraints::{ConstraintSet, Satisfaction};
pub use paths::{find_paths, Path};
pub use rank::{Recommendation, ScoredDoctor};
pub use semantic::{DoctorSemantics, ScoredPath};

use carepath_graph::{
    EmbeddingError, EmbeddingTable, EntityId, EntityKind, KnowledgeGraph,
};
use rayon::prelude::*;

/// Query-time failure. Reachability misses are not errors — they surface as
/// an empty [`Recommendation`] with a note.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("query start {name:?} is a {kind} entity, not a symptom")]
    NotASymptom { name: String, kind: EntityKind },
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// A resolved query: symptom entity ids plus constraints.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub symptoms: Vec<EntityId>,
    pub constraints: ConstraintSet,
}

/// The reasoning engine: borrowed graph snapshot, embedding table, config.
pub struct Engine<'a> {
    graph: &'a KnowledgeGraph,
    embeddings: &'a EmbeddingTable,
    config: EngineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(
        graph: &'a KnowledgeGraph,
        embeddings: &'a EmbeddingTable,
        config: EngineConfig,
    ) -> Self {
        Self {
            graph,
            embeddings,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one query end to end.
    pub fn recommend(&self, query: &Query) -> Result<Recommendation, EngineError> {
        for &id in &query.symptoms {
            let kind = self.graph.kind(id);
            if kind != EntityKind::Symptom {
                return Err(EngineError::NotASymptom {
                    name: self.graph.name(id).to_string(),
                    kind,
                });
            }
        }

        let mut by_doctor = paths::find_paths(self.graph, &query.symptoms, self.config.max_hops);
        if let Some(cap) = self.config.max_candidates {
            paths::cap_candidates(&mut by_doctor, cap);
        }

        tracing::debug!(
            candidates = by_doctor.len(),
            paths = by_doctor.values().map(Vec::len).sum::<usize>(),
            "path retrieval complete"
        );

        if by_doctor.is_empty() {
            return Ok(self.no_match(query));
        }

        // Deterministic work list; rayon preserves the input order of the
        // collected results, and ranking re-normalizes anyway.
        let mut work: Vec<(EntityId, Vec<Path>)> = by_doctor.into_iter().collect();
        work.sort_unstable_by_key(|(doctor, _)| *doctor);

        let scored: Vec<Option<ScoredDoctor>> = work
            .into_par_iter()
            .map(|(doctor, doctor_paths)| self.score_doctor(doctor, doctor_paths, query))
            .collect::<Result<_, EngineError>>()?;
        let mut scored: Vec<ScoredDoctor> = scored.into_iter().flatten().collect();

        if scored.is_empty() {
            return Ok(self.no_match(query));
        }

        rank::rank(&mut scored, &self.config);
        Ok(Recommendation {
            ranked: scored,
            note: None,
        })
    }

    fn score_doctor(
        &self,
        doctor: EntityId,
        doctor_paths: Vec<Path>,
        query: &Query,
    ) -> Result<Option<ScoredDoctor>, EngineError> {
        let Some(semantics) =
            semantic::score_doctor_paths(self.graph, self.embeddings, doctor_paths, &self.config)?
        else {
            return Ok(None);
        };

        let satisfaction = constraints::satisfaction(
            self.graph,
            doctor,
            &query.constraints,
            self.config.decay,
            self.config.combine,
        );

        let final_score = satisfaction.total * semantics.relevance;
        let name = self.graph.name(doctor).to_string();
        let explanation = explain::doctor_explanation(
            self.graph,
            &name,
            &semantics.paths[0],
            &satisfaction,
            &query.constraints,
        );

        Ok(Some(ScoredDoctor {
            doctor,
            name,
            relevance: semantics.relevance,
            satisfaction,
            final_score,
            top_paths: semantics.paths,
            explanation,
        }))
    }

    fn no_match(&self, query: &Query) -> Recommendation {
        let symptoms: Vec<String> = query
            .symptoms
            .iter()
            .map(|&id| self.graph.name(id).to_string())
            .collect();
        Recommendation {
            ranked: Vec::new(),
            note: Some(explain::no_match_explanation(&symptoms, self.config.max_hops)),
        }
    }
}
