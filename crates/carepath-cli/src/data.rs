//! JSON record loading.
//!
//! Reads the three source collections — `symptoms.json`, `diseases.json`,
//! `doctors.json` — and lowers them into typed entity and edge records for
//! `KnowledgeGraph::build`. Satellite entities (price, location, insurance)
//! are invented here so socio-economic data lives in the graph rather than
//! on the doctor node.

use anyhow::{Context, Result};
use carepath_graph::{
    EdgeRecord, EntityKind, EntityRecord, KnowledgeGraph, RelationKind, ATTR_AMOUNT, ATTR_X,
    ATTR_Y,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct SymptomRecord {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DiseaseRecord {
    pub id: String,
    pub associated_symptom: String,
    pub required_specialty: String,
}

#[derive(Debug, Deserialize)]
pub struct DoctorRecord {
    pub name: String,
    pub specialty: String,
    pub fee: f64,
    pub location: [f64; 2],
    #[serde(default)]
    pub insurance: Vec<String>,
}

/// Load and lower the three record files under `dir`.
pub fn load_records(dir: &Path) -> Result<(Vec<EntityRecord>, Vec<EdgeRecord>)> {
    let symptoms: Vec<SymptomRecord> = read_json(&dir.join("symptoms.json"))?;
    let diseases: Vec<DiseaseRecord> = read_json(&dir.join("diseases.json"))?;
    let doctors: Vec<DoctorRecord> = read_json(&dir.join("doctors.json"))?;
    Ok(lower_records(symptoms, diseases, doctors))
}

/// Load records and build the graph in one step.
pub fn load_graph(dir: &Path) -> Result<KnowledgeGraph> {
    let (entities, edges) = load_records(dir)?;
    let graph = KnowledgeGraph::build(entities, edges)?;
    tracing::info!(
        entities = graph.entity_count(),
        edges = graph.edge_count(),
        "knowledge graph constructed"
    );
    Ok(graph)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Lower source records into entity/edge records.
///
/// Symptoms referenced only by a disease, and specialties referenced only by
/// a doctor, are created implicitly; a record file therefore never needs to
/// pre-declare every node.
pub fn lower_records(
    symptoms: Vec<SymptomRecord>,
    diseases: Vec<DiseaseRecord>,
    doctors: Vec<DoctorRecord>,
) -> (Vec<EntityRecord>, Vec<EdgeRecord>) {
    let mut symptom_names: BTreeSet<String> = symptoms.into_iter().map(|s| s.id).collect();
    let mut specialty_names: BTreeSet<String> = BTreeSet::new();
    let mut insurance_names: BTreeSet<String> = BTreeSet::new();

    for disease in &diseases {
        symptom_names.insert(disease.associated_symptom.clone());
        specialty_names.insert(disease.required_specialty.clone());
    }
    for doctor in &doctors {
        specialty_names.insert(doctor.specialty.clone());
        for network in &doctor.insurance {
            insurance_names.insert(network.clone());
        }
    }

    let mut entities = Vec::new();
    let mut edges = Vec::new();

    for name in &symptom_names {
        entities.push(EntityRecord::new(EntityKind::Symptom, name.clone()));
    }
    for name in &specialty_names {
        entities.push(EntityRecord::new(EntityKind::Specialty, name.clone()));
    }
    for name in &insurance_names {
        entities.push(EntityRecord::new(EntityKind::Insurance, name.clone()));
    }

    for disease in &diseases {
        entities.push(EntityRecord::new(EntityKind::Disease, disease.id.clone()));
        edges.push(EdgeRecord::new(
            RelationKind::HasSymptom,
            disease.associated_symptom.clone(),
            disease.id.clone(),
        ));
        edges.push(EdgeRecord::new(
            RelationKind::RequiresSpecialty,
            disease.id.clone(),
            disease.required_specialty.clone(),
        ));
    }

    for doctor in &doctors {
        entities.push(EntityRecord::new(EntityKind::Doctor, doctor.name.clone()));
        edges.push(EdgeRecord::new(
            RelationKind::HasDoctor,
            doctor.specialty.clone(),
            doctor.name.clone(),
        ));
        edges.push(EdgeRecord::new(
            RelationKind::PracticesSpecialty,
            doctor.name.clone(),
            doctor.specialty.clone(),
        ));

        let price_name = format!("{}/fee", doctor.name);
        entities.push(
            EntityRecord::new(EntityKind::Price, price_name.clone())
                .with_attr(ATTR_AMOUNT, doctor.fee),
        );
        edges.push(EdgeRecord::new(
            RelationKind::ChargesFee,
            doctor.name.clone(),
            price_name,
        ));

        let location_name = format!("{}/location", doctor.name);
        entities.push(
            EntityRecord::new(EntityKind::Location, location_name.clone())
                .with_attr(ATTR_X, doctor.location[0])
                .with_attr(ATTR_Y, doctor.location[1]),
        );
        edges.push(EdgeRecord::new(
            RelationKind::LocatedIn,
            doctor.name.clone(),
            location_name,
        ));

        for network in &doctor.insurance {
            edges.push(EdgeRecord::new(
                RelationKind::AcceptsInsurance,
                doctor.name.clone(),
                network.clone(),
            ));
        }
    }

    (entities, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let mut f = fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(body.as_bytes()).unwrap();
        };
        write(
            "symptoms.json",
            r#"[{"id": "Severe Back Pain", "type": "Symptom"}]"#,
        );
        write(
            "diseases.json",
            r#"[{"id": "Back Strain",
                 "associated_symptom": "Severe Back Pain",
                 "required_specialty": "Orthopedics"}]"#,
        );
        write(
            "doctors.json",
            r#"[{"name": "Dr. Patel", "specialty": "Orthopedics", "fee": 55,
                 "location": [12, 10], "insurance": ["Basic", "Gold"]}]"#,
        );
        dir
    }

    #[test]
    fn loads_original_shaped_records() {
        let dir = fixture_dir();
        let graph = load_graph(dir.path()).unwrap();

        let symptom = graph
            .resolve(EntityKind::Symptom, "Severe Back Pain")
            .unwrap();
        let disease = graph.resolve(EntityKind::Disease, "Back Strain").unwrap();
        let doctor = graph.resolve(EntityKind::Doctor, "Dr. Patel").unwrap();

        assert_eq!(
            graph.first_target(symptom, RelationKind::HasSymptom),
            Some(disease)
        );

        let fee = graph
            .first_target(doctor, RelationKind::ChargesFee)
            .and_then(|p| graph.number_attr(p, ATTR_AMOUNT));
        assert_eq!(fee, Some(55.0));

        let accepted = graph.targets(doctor, RelationKind::AcceptsInsurance);
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn disease_only_symptoms_are_created_implicitly() {
        let (entities, _) = lower_records(
            vec![],
            vec![DiseaseRecord {
                id: "Migraine".to_string(),
                associated_symptom: "Headache".to_string(),
                required_specialty: "Neurology".to_string(),
            }],
            vec![],
        );
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Symptom && e.name == "Headache"));
    }

    #[test]
    fn missing_file_is_a_context_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_graph(dir.path()).unwrap_err();
        assert!(err.to_string().contains("symptoms.json"));
    }
}
