//! Embedding tables for entities and relation kinds.
//!
//! The engine consumes fixed-dimension vectors; it never trains them. Rows
//! come either from an external file (`from_records`) or from a deterministic
//! seeded generator (`seeded`) that derives a unit vector per (kind, name)
//! pair — bit-identical across runs and platforms for a given seed, which
//! keeps demo output and tests reproducible without a model artifact.
//!
//! Lookups return `Result`: a missing row is a typed error, never a silently
//! defaulted zero vector.

use crate::schema::{EntityKind, RelationKind};
use crate::store::{EntityId, KnowledgeGraph};
use serde::{Deserialize, Serialize};

/// Missing or malformed embedding data.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("no embedding vector for {kind} entity {name:?}")]
    MissingEntity { kind: EntityKind, name: String },
    #[error("no embedding vector for relation {0}")]
    MissingRelation(RelationKind),
    #[error("embedding dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("embedding record references unknown {kind} entity {name:?}")]
    UnknownEntity { kind: EntityKind, name: String },
}

/// Key of one embedding row in an external file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingKey {
    Entity { entity_kind: EntityKind, name: String },
    Relation { relation: RelationKind },
}

/// One row of an external embedding file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub key: EmbeddingKey,
    pub vector: Vec<f32>,
}

/// External embedding file: a dimension plus keyed rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingFile {
    pub dim: usize,
    pub items: Vec<EmbeddingRecord>,
}

/// Read-only vector lookup for entities and relation kinds.
#[derive(Debug)]
pub struct EmbeddingTable {
    dim: usize,
    /// Entity rows, indexed by entity id.
    entities: Vec<Option<Vec<f32>>>,
    /// Relation rows, indexed by `RelationKind::index()`.
    relations: Vec<Option<Vec<f32>>>,
}

impl EmbeddingTable {
    /// Build a table from externally supplied rows.
    ///
    /// Rows for unknown entities and rows of the wrong dimension are errors;
    /// *absent* rows are not detected here but at lookup time, so a partial
    /// table can still serve queries that never touch the gaps.
    pub fn from_records(
        graph: &KnowledgeGraph,
        dim: usize,
        records: Vec<EmbeddingRecord>,
    ) -> Result<Self, EmbeddingError> {
        let mut table = Self::empty(graph, dim);
        for record in records {
            if record.vector.len() != dim {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dim,
                    found: record.vector.len(),
                });
            }
            match record.key {
                EmbeddingKey::Entity { entity_kind, name } => {
                    let id = graph.resolve(entity_kind, &name).ok_or_else(|| {
                        EmbeddingError::UnknownEntity {
                            kind: entity_kind,
                            name,
                        }
                    })?;
                    table.entities[id.raw() as usize] = Some(record.vector);
                }
                EmbeddingKey::Relation { relation } => {
                    table.relations[relation.index()] = Some(record.vector);
                }
            }
        }
        Ok(table)
    }

    /// Build a complete table of deterministic unit vectors derived from
    /// `seed` and each row's (kind, name) identity.
    pub fn seeded(graph: &KnowledgeGraph, dim: usize, seed: u64) -> Self {
        let mut table = Self::empty(graph, dim);
        for id in graph.entity_ids() {
            let mut state = mix_key(seed, graph.kind(id).as_str(), graph.name(id));
            table.entities[id.raw() as usize] = Some(unit_vector(dim, &mut state));
        }
        for relation in RelationKind::ALL {
            let mut state = mix_key(seed, "relation", relation.as_str());
            table.relations[relation.index()] = Some(unit_vector(dim, &mut state));
        }
        table
    }

    fn empty(graph: &KnowledgeGraph, dim: usize) -> Self {
        Self {
            dim,
            entities: vec![None; graph.entity_count()],
            relations: vec![None; RelationKind::ALL.len()],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Vector for an entity; the graph supplies the name for error reporting.
    pub fn entity(
        &self,
        graph: &KnowledgeGraph,
        id: EntityId,
    ) -> Result<&[f32], EmbeddingError> {
        self.entities[id.raw() as usize]
            .as_deref()
            .ok_or_else(|| EmbeddingError::MissingEntity {
                kind: graph.kind(id),
                name: graph.name(id).to_string(),
            })
    }

    pub fn relation(&self, relation: RelationKind) -> Result<&[f32], EmbeddingError> {
        self.relations[relation.index()]
            .as_deref()
            .ok_or(EmbeddingError::MissingRelation(relation))
    }
}

/// splitmix64 step: the generator behind the seeded table.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fold the seed and a (namespace, name) pair into an initial stream state.
fn mix_key(seed: u64, namespace: &str, name: &str) -> u64 {
    let mut state = seed ^ 0x6a09_e667_f3bc_c909;
    for byte in namespace.as_bytes().iter().chain(name.as_bytes()) {
        state ^= u64::from(*byte);
        splitmix64(&mut state);
    }
    state
}

fn unit_vector(dim: usize, state: &mut u64) -> Vec<f32> {
    let mut v: Vec<f32> = (0..dim)
        .map(|_| {
            // Top 24 bits → uniform in [-1, 1).
            let bits = (splitmix64(state) >> 40) as f32;
            bits / (1u32 << 23) as f32 - 1.0
        })
        .collect();
    normalize_in_place(&mut v);
    v
}

fn normalize_in_place(v: &mut [f32]) {
    let mut norm2 = 0.0f32;
    for x in v.iter() {
        norm2 += x * x;
    }
    if norm2 <= 0.0 {
        return;
    }
    let inv = 1.0f32 / norm2.sqrt();
    for x in v.iter_mut() {
        *x *= inv;
    }
}
