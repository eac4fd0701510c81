//! Entity and relation vocabulary for the medical knowledge graph.
//!
//! The vocabulary is a closed enumeration: every entity belongs to exactly one
//! kind, and every relation kind fixes the (source-kind, target-kind) pair it
//! is allowed to connect. Edges violating an endpoint constraint are rejected
//! at build time, so downstream traversal and scoring never re-check kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute key for the numeric amount on a `Price` entity.
pub const ATTR_AMOUNT: &str = "amount";
/// Attribute keys for the planar coordinates on a `Location` entity.
pub const ATTR_X: &str = "x";
pub const ATTR_Y: &str = "y";

/// Kind of an entity node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Symptom,
    Disease,
    Specialty,
    Doctor,
    Location,
    Price,
    Insurance,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Symptom,
        EntityKind::Disease,
        EntityKind::Specialty,
        EntityKind::Doctor,
        EntityKind::Location,
        EntityKind::Price,
        EntityKind::Insurance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Symptom => "symptom",
            EntityKind::Disease => "disease",
            EntityKind::Specialty => "specialty",
            EntityKind::Doctor => "doctor",
            EntityKind::Location => "location",
            EntityKind::Price => "price",
            EntityKind::Insurance => "insurance",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Kind of a directed edge.
///
/// `HasSymptom` is oriented symptom → disease so that traversal from a
/// reported symptom can reach treatment; `HasDoctor` closes the chain from a
/// specialty to its practitioners. The remaining doctor-sourced relations
/// carry socio-economic satellites (`Location`, `Price`, `Insurance`) and the
/// declared specialty.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Symptom → Disease: the symptom is associated with the disease.
    HasSymptom,
    /// Disease → Specialty: treating the disease requires the specialty.
    RequiresSpecialty,
    /// Specialty → Doctor: the doctor practices under the specialty.
    HasDoctor,
    /// Disease → Doctor: the doctor directly treats the disease.
    TreatedBy,
    /// Doctor → Specialty: declared specialty of the doctor.
    PracticesSpecialty,
    /// Doctor → Location: practice coordinates.
    LocatedIn,
    /// Doctor → Price: consultation fee.
    ChargesFee,
    /// Doctor → Insurance: accepted insurance network.
    AcceptsInsurance,
}

impl RelationKind {
    pub const ALL: [RelationKind; 8] = [
        RelationKind::HasSymptom,
        RelationKind::RequiresSpecialty,
        RelationKind::HasDoctor,
        RelationKind::TreatedBy,
        RelationKind::PracticesSpecialty,
        RelationKind::LocatedIn,
        RelationKind::ChargesFee,
        RelationKind::AcceptsInsurance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::HasSymptom => "has_symptom",
            RelationKind::RequiresSpecialty => "requires_specialty",
            RelationKind::HasDoctor => "has_doctor",
            RelationKind::TreatedBy => "treated_by",
            RelationKind::PracticesSpecialty => "practices_specialty",
            RelationKind::LocatedIn => "located_in",
            RelationKind::ChargesFee => "charges_fee",
            RelationKind::AcceptsInsurance => "accepts_insurance",
        }
    }

    /// The (source, target) entity kinds this relation may connect.
    pub fn endpoints(self) -> (EntityKind, EntityKind) {
        match self {
            RelationKind::HasSymptom => (EntityKind::Symptom, EntityKind::Disease),
            RelationKind::RequiresSpecialty => (EntityKind::Disease, EntityKind::Specialty),
            RelationKind::HasDoctor => (EntityKind::Specialty, EntityKind::Doctor),
            RelationKind::TreatedBy => (EntityKind::Disease, EntityKind::Doctor),
            RelationKind::PracticesSpecialty => (EntityKind::Doctor, EntityKind::Specialty),
            RelationKind::LocatedIn => (EntityKind::Doctor, EntityKind::Location),
            RelationKind::ChargesFee => (EntityKind::Doctor, EntityKind::Price),
            RelationKind::AcceptsInsurance => (EntityKind::Doctor, EntityKind::Insurance),
        }
    }

    /// Stable index into per-relation tables (embedding rows).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
