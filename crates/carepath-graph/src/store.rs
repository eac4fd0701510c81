//! Immutable typed multigraph storage.
//!
//! Entities are interned into dense `u32` ids at build time; names, kinds and
//! attributes live in columns indexed by that id, with a `RoaringBitmap` per
//! kind for set queries. Edges live in an arena with a per-entity outgoing
//! adjacency list, so traversal touches only index lookups and never
//! allocates per step.
//!
//! `build` is the only constructor and the struct exposes no mutating
//! methods: a `KnowledgeGraph` is a snapshot, safe to share across query
//! threads by reference.

use crate::schema::{EntityKind, RelationKind};
use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Entity Ids and Attributes
// ============================================================================

/// Interned entity id (dense, 4 bytes).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn raw(self) -> u32 {
        self.0
    }

    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Attribute value on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Number(_) => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

// ============================================================================
// Source Records
// ============================================================================

/// Source record for one entity.
///
/// Names are unique within a kind; the same name may appear under different
/// kinds (a specialty and a doctor may share a label without colliding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub name: String,
    #[serde(default)]
    pub attrs: HashMap<String, AttrValue>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// Source record for one directed edge. Endpoint names resolve in the
/// namespaces fixed by the relation's endpoint kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub relation: RelationKind,
    pub source: String,
    pub target: String,
}

impl EdgeRecord {
    pub fn new(
        relation: RelationKind,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            relation,
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A resolved directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source: EntityId,
    pub relation: RelationKind,
    pub target: EntityId,
}

/// Malformed graph input. Fatal at build time; the caller must fix the
/// records before retrying.
#[derive(Debug, thiserror::Error)]
pub enum StructuralError {
    #[error("duplicate {kind} entity {name:?}")]
    DuplicateEntity { kind: EntityKind, name: String },
    #[error("{relation} edge references unknown {kind} entity {name:?}")]
    UnknownEndpoint {
        relation: RelationKind,
        kind: EntityKind,
        name: String,
    },
    #[error(
        "{relation} edge expects a {expected} endpoint but {name:?} is a {found}"
    )]
    EndpointKindMismatch {
        relation: RelationKind,
        expected: EntityKind,
        found: EntityKind,
        name: String,
    },
}

// ============================================================================
// Graph Storage (Columnar + Adjacency Indexed)
// ============================================================================

/// Immutable typed multigraph over medical and socio-economic entities.
#[derive(Debug)]
pub struct KnowledgeGraph {
    /// Name column: entity id → name.
    names: Vec<String>,
    /// Kind column: entity id → kind.
    kinds: Vec<EntityKind>,
    /// Attribute column: entity id → attribute map.
    attrs: Vec<HashMap<String, AttrValue>>,
    /// Resolver: (kind, name) → entity id.
    by_name: AHashMap<(EntityKind, String), EntityId>,
    /// Kind index: kind → bitmap of entity ids.
    kind_index: AHashMap<EntityKind, RoaringBitmap>,
    /// Edge arena, in insertion order.
    edges: Vec<Edge>,
    /// Outgoing adjacency: entity id → edge ids into the arena.
    outgoing: Vec<Vec<u32>>,
}

impl KnowledgeGraph {
    /// Build a graph snapshot from entity and edge records.
    pub fn build(
        entities: Vec<EntityRecord>,
        edge_records: Vec<EdgeRecord>,
    ) -> Result<Self, StructuralError> {
        let mut names = Vec::with_capacity(entities.len());
        let mut kinds = Vec::with_capacity(entities.len());
        let mut attrs = Vec::with_capacity(entities.len());
        let mut by_name: AHashMap<(EntityKind, String), EntityId> = AHashMap::new();
        let mut kind_index: AHashMap<EntityKind, RoaringBitmap> = AHashMap::new();

        for record in entities {
            let id = EntityId::from_index(names.len());
            let key = (record.kind, record.name.clone());
            if by_name.contains_key(&key) {
                return Err(StructuralError::DuplicateEntity {
                    kind: record.kind,
                    name: record.name,
                });
            }
            by_name.insert(key, id);
            kind_index.entry(record.kind).or_default().insert(id.raw());
            names.push(record.name);
            kinds.push(record.kind);
            attrs.push(record.attrs);
        }

        let mut edges = Vec::with_capacity(edge_records.len());
        let mut outgoing = vec![Vec::new(); names.len()];

        for record in edge_records {
            let (source_kind, target_kind) = record.relation.endpoints();
            let source = resolve_endpoint(
                &by_name,
                &kinds,
                record.relation,
                source_kind,
                &record.source,
            )?;
            let target = resolve_endpoint(
                &by_name,
                &kinds,
                record.relation,
                target_kind,
                &record.target,
            )?;

            let edge_id = edges.len() as u32;
            edges.push(Edge {
                source,
                relation: record.relation,
                target,
            });
            outgoing[source.index()].push(edge_id);
        }

        Ok(Self {
            names,
            kinds,
            attrs,
            by_name,
            kind_index,
            edges,
            outgoing,
        })
    }

    /// Look up an entity id by kind and name.
    pub fn resolve(&self, kind: EntityKind, name: &str) -> Option<EntityId> {
        self.by_name.get(&(kind, name.to_string())).copied()
    }

    pub fn name(&self, id: EntityId) -> &str {
        &self.names[id.index()]
    }

    pub fn kind(&self, id: EntityId) -> EntityKind {
        self.kinds[id.index()]
    }

    pub fn attr(&self, id: EntityId, key: &str) -> Option<&AttrValue> {
        self.attrs[id.index()].get(key)
    }

    pub fn number_attr(&self, id: EntityId, key: &str) -> Option<f64> {
        self.attr(id, key).and_then(AttrValue::as_number)
    }

    /// Edge ids leaving `id`, in edge insertion order.
    pub fn outgoing_ids(&self, id: EntityId) -> &[u32] {
        &self.outgoing[id.index()]
    }

    /// Outgoing edges of `id`, in edge insertion order.
    pub fn outgoing(&self, id: EntityId) -> impl Iterator<Item = &Edge> {
        self.outgoing[id.index()].iter().map(|&e| &self.edges[e as usize])
    }

    pub fn edge(&self, edge_id: u32) -> &Edge {
        &self.edges[edge_id as usize]
    }

    /// First outgoing edge of `id` with the given relation, if any.
    pub fn first_target(&self, id: EntityId, relation: RelationKind) -> Option<EntityId> {
        self.outgoing(id)
            .find(|edge| edge.relation == relation)
            .map(|edge| edge.target)
    }

    /// All targets reachable from `id` via `relation`.
    pub fn targets(&self, id: EntityId, relation: RelationKind) -> Vec<EntityId> {
        self.outgoing(id)
            .filter(|edge| edge.relation == relation)
            .map(|edge| edge.target)
            .collect()
    }

    /// Bitmap of entity ids of the given kind.
    pub fn entities_of_kind(&self, kind: EntityKind) -> Option<&RoaringBitmap> {
        self.kind_index.get(&kind)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> {
        (0..self.names.len() as u32).map(EntityId)
    }

    pub fn entity_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn resolve_endpoint(
    by_name: &AHashMap<(EntityKind, String), EntityId>,
    kinds: &[EntityKind],
    relation: RelationKind,
    expected: EntityKind,
    name: &str,
) -> Result<EntityId, StructuralError> {
    if let Some(&id) = by_name.get(&(expected, name.to_string())) {
        debug_assert_eq!(kinds[id.index()], expected);
        return Ok(id);
    }

    // Name exists under another kind: report the mismatch rather than a
    // generic unknown-endpoint error.
    for kind in EntityKind::ALL {
        if kind == expected {
            continue;
        }
        if by_name.contains_key(&(kind, name.to_string())) {
            return Err(StructuralError::EndpointKindMismatch {
                relation,
                expected,
                found: kind,
                name: name.to_string(),
            });
        }
    }

    Err(StructuralError::UnknownEndpoint {
        relation,
        kind: expected,
        name: name.to_string(),
    })
}
