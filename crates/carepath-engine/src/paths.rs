//! Bounded simple-path enumeration from symptom nodes to doctor nodes.
//!
//! Depth-first search over the immutable adjacency arena. Each in-progress
//! branch carries its own visited marking (backtracked on return), so
//! accepted paths are node-simple by construction. A branch dies when it
//! exceeds the hop budget or runs out of unvisited outgoing edges; it is
//! accepted exactly when it lands on a doctor. Doctors terminate extension —
//! a path never continues through one.
//!
//! Enumeration is deterministic: starts are processed in ascending id order
//! and edges in insertion order. Callers may rely on the returned *set* of
//! paths only, not on its order.

use ahash::AHashMap;
use carepath_graph::{EntityId, EntityKind, KnowledgeGraph};

/// A symptom-to-doctor path: ordered entity chain plus the edge ids walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<EntityId>,
    edges: Vec<u32>,
}

impl Path {
    /// Entity chain from the start symptom to the doctor, inclusive.
    pub fn nodes(&self) -> &[EntityId] {
        &self.nodes
    }

    /// Edge ids into the graph arena, one per hop.
    pub fn edge_ids(&self) -> &[u32] {
        &self.edges
    }

    /// Number of hops (edges).
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn start(&self) -> EntityId {
        self.nodes[0]
    }

    pub fn doctor(&self) -> EntityId {
        self.nodes[self.nodes.len() - 1]
    }
}

/// Enumerate all simple paths of length `1..=max_hops` from `starts` to
/// doctor entities. Doctors with no accepted path are absent from the map.
pub fn find_paths(
    graph: &KnowledgeGraph,
    starts: &[EntityId],
    max_hops: usize,
) -> AHashMap<EntityId, Vec<Path>> {
    let mut by_doctor: AHashMap<EntityId, Vec<Path>> = AHashMap::new();
    if max_hops == 0 {
        return by_doctor;
    }

    let mut ordered: Vec<EntityId> = starts.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut visited = vec![false; graph.entity_count()];
    let mut nodes: Vec<EntityId> = Vec::with_capacity(max_hops + 1);
    let mut edges: Vec<u32> = Vec::with_capacity(max_hops);

    for start in ordered {
        visited[start.raw() as usize] = true;
        nodes.push(start);
        extend(graph, max_hops, &mut visited, &mut nodes, &mut edges, &mut by_doctor);
        nodes.pop();
        visited[start.raw() as usize] = false;
    }

    by_doctor
}

fn extend(
    graph: &KnowledgeGraph,
    max_hops: usize,
    visited: &mut Vec<bool>,
    nodes: &mut Vec<EntityId>,
    edges: &mut Vec<u32>,
    by_doctor: &mut AHashMap<EntityId, Vec<Path>>,
) {
    let current = nodes[nodes.len() - 1];
    for &edge_id in graph.outgoing_ids(current) {
        let edge = graph.edge(edge_id);
        if visited[edge.target.raw() as usize] {
            continue;
        }

        nodes.push(edge.target);
        edges.push(edge_id);

        if graph.kind(edge.target) == EntityKind::Doctor {
            by_doctor.entry(edge.target).or_default().push(Path {
                nodes: nodes.clone(),
                edges: edges.clone(),
            });
        } else if edges.len() < max_hops {
            visited[edge.target.raw() as usize] = true;
            extend(graph, max_hops, visited, nodes, edges, by_doctor);
            visited[edge.target.raw() as usize] = false;
        }

        edges.pop();
        nodes.pop();
    }
}

/// Deterministically truncate the candidate doctor set to `cap` doctors
/// (ascending entity id).
pub fn cap_candidates(by_doctor: &mut AHashMap<EntityId, Vec<Path>>, cap: usize) {
    if by_doctor.len() <= cap {
        return;
    }
    let mut doctors: Vec<EntityId> = by_doctor.keys().copied().collect();
    doctors.sort_unstable();
    for doctor in doctors.into_iter().skip(cap) {
        by_doctor.remove(&doctor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carepath_graph::{EdgeRecord, EntityRecord, RelationKind};

    fn chain_graph() -> KnowledgeGraph {
        KnowledgeGraph::build(
            vec![
                EntityRecord::new(EntityKind::Symptom, "S1"),
                EntityRecord::new(EntityKind::Disease, "D1"),
                EntityRecord::new(EntityKind::Specialty, "Sp1"),
                EntityRecord::new(EntityKind::Doctor, "A"),
                EntityRecord::new(EntityKind::Doctor, "B"),
            ],
            vec![
                EdgeRecord::new(RelationKind::HasSymptom, "S1", "D1"),
                EdgeRecord::new(RelationKind::RequiresSpecialty, "D1", "Sp1"),
                EdgeRecord::new(RelationKind::HasDoctor, "Sp1", "A"),
                EdgeRecord::new(RelationKind::HasDoctor, "Sp1", "B"),
                EdgeRecord::new(RelationKind::TreatedBy, "D1", "A"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn finds_both_routes_to_a_doctor() {
        let graph = chain_graph();
        let s1 = graph.resolve(EntityKind::Symptom, "S1").unwrap();
        let a = graph.resolve(EntityKind::Doctor, "A").unwrap();
        let b = graph.resolve(EntityKind::Doctor, "B").unwrap();

        let by_doctor = find_paths(&graph, &[s1], 4);

        // A via S1→D1→Sp1→A and via S1→D1→A; B via the specialty only.
        assert_eq!(by_doctor[&a].len(), 2);
        assert_eq!(by_doctor[&b].len(), 1);

        let lens: Vec<usize> = by_doctor[&a].iter().map(Path::len).collect();
        assert!(lens.contains(&2) && lens.contains(&3));
    }

    #[test]
    fn hop_budget_cuts_long_routes() {
        let graph = chain_graph();
        let s1 = graph.resolve(EntityKind::Symptom, "S1").unwrap();
        let a = graph.resolve(EntityKind::Doctor, "A").unwrap();
        let b = graph.resolve(EntityKind::Doctor, "B").unwrap();

        let by_doctor = find_paths(&graph, &[s1], 2);
        // Only the direct TreatedBy route fits in two hops.
        assert_eq!(by_doctor[&a].len(), 1);
        assert!(!by_doctor.contains_key(&b));

        assert!(find_paths(&graph, &[s1], 0).is_empty());
    }

    #[test]
    fn unreachable_doctors_are_absent_not_empty() {
        let graph = chain_graph();
        let sp1 = graph.resolve(EntityKind::Specialty, "Sp1").unwrap();
        let by_doctor = find_paths(&graph, &[sp1], 4);
        for paths in by_doctor.values() {
            assert!(!paths.is_empty());
        }
    }

    #[test]
    fn duplicate_starts_do_not_duplicate_paths() {
        let graph = chain_graph();
        let s1 = graph.resolve(EntityKind::Symptom, "S1").unwrap();
        let a = graph.resolve(EntityKind::Doctor, "A").unwrap();
        let by_doctor = find_paths(&graph, &[s1, s1], 4);
        assert_eq!(by_doctor[&a].len(), 2);
    }

    #[test]
    fn candidate_cap_keeps_lowest_ids() {
        let graph = chain_graph();
        let s1 = graph.resolve(EntityKind::Symptom, "S1").unwrap();
        let a = graph.resolve(EntityKind::Doctor, "A").unwrap();

        let mut by_doctor = find_paths(&graph, &[s1], 4);
        cap_candidates(&mut by_doctor, 1);
        assert_eq!(by_doctor.len(), 1);
        assert!(by_doctor.contains_key(&a));
    }
}
