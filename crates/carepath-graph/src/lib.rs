//! Carepath knowledge graph: typed storage for medical concepts and the
//! socio-economic attributes of care providers.
//!
//! The graph links symptoms to diseases, diseases to specialties and doctors,
//! and doctors to their fee, location and insurance satellites. It is built
//! once from validated records and is immutable afterwards; all query-time
//! reasoning (path search, scoring, constraint checks) lives in
//! `carepath-engine` and only reads this snapshot.
//!
//! Embedding vectors for entities and relation kinds are held in a separate
//! read-only [`EmbeddingTable`]; the graph itself stores no learned state.

pub mod embedding;
pub mod schema;
pub mod store;

pub use embedding::{
    EmbeddingError, EmbeddingFile, EmbeddingKey, EmbeddingRecord, EmbeddingTable,
};
pub use schema::{EntityKind, RelationKind, ATTR_AMOUNT, ATTR_X, ATTR_Y};
pub use store::{
    AttrValue, Edge, EdgeRecord, EntityId, EntityRecord, KnowledgeGraph, StructuralError,
};
