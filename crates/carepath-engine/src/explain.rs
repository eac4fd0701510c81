//! Templated explanations for ranked doctors and empty results.
//!
//! Purely derived from the scored data; no external state, no generation.

use crate::constraints::{ConstraintSet, Satisfaction};
use crate::semantic::ScoredPath;
use carepath_graph::KnowledgeGraph;
use std::fmt::Write;

/// Render the entity chain of a path as `A -> B -> C`.
pub fn path_chain(graph: &KnowledgeGraph, path: &crate::paths::Path) -> String {
    let names: Vec<&str> = path.nodes().iter().map(|&id| graph.name(id)).collect();
    names.join(" -> ")
}

/// Build the per-doctor explanation: best path, weight share, and one line
/// per constraint dimension with its numeric margin.
pub fn doctor_explanation(
    graph: &KnowledgeGraph,
    name: &str,
    best: &ScoredPath,
    satisfaction: &Satisfaction,
    constraints: &ConstraintSet,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{name}: matched via {} ({} hop{}, path weight {:.0}%).",
        path_chain(graph, &best.path),
        best.path.len(),
        if best.path.len() == 1 { "" } else { "s" },
        best.weight * 100.0,
    );

    match (constraints.max_budget, satisfaction.fee) {
        (Some(budget), Some(fee)) if fee <= budget => {
            let _ = writeln!(out, "Cost: fee ${fee:.0} within budget ${budget:.0}.");
        }
        (Some(budget), Some(fee)) => {
            let _ = writeln!(
                out,
                "Cost: fee ${fee:.0} exceeds budget ${budget:.0} by ${:.0} (score {:.2}).",
                fee - budget,
                satisfaction.cost,
            );
        }
        (Some(budget), None) => {
            let _ = writeln!(out, "Cost: no fee on record (budget ${budget:.0} not applied).");
        }
        (None, _) => {
            let _ = writeln!(out, "Cost: unconstrained.");
        }
    }

    match (satisfaction.distance_km, constraints.max_distance) {
        (Some(distance), Some(max)) if distance <= max => {
            let _ = writeln!(out, "Distance: {distance:.1} km away, within {max:.1} km.");
        }
        (Some(distance), Some(max)) => {
            let _ = writeln!(
                out,
                "Distance: {distance:.1} km away, beyond {max:.1} km (score {:.2}).",
                satisfaction.geo,
            );
        }
        (Some(distance), None) => {
            let _ = writeln!(out, "Distance: {distance:.1} km away.");
        }
        (None, _) => {
            let _ = writeln!(out, "Distance: unconstrained.");
        }
    }

    match (&constraints.required_insurance, satisfaction.insurance_matched) {
        (Some(required), Some(true)) => {
            let _ = writeln!(out, "Insurance: {required} accepted.");
        }
        (Some(required), _) => {
            let _ = writeln!(out, "Insurance: {required} not accepted.");
        }
        (None, _) => {
            let _ = writeln!(out, "Insurance: unconstrained.");
        }
    }

    out
}

/// Explanation for an empty result: distinct from a pipeline failure.
pub fn no_match_explanation(symptoms: &[String], max_hops: usize) -> String {
    if symptoms.is_empty() {
        return "No symptoms were recognized, so no doctor could be matched.".to_string();
    }
    format!(
        "No doctor is reachable within {max_hops} hops of {}. \
         The knowledge graph has no treatment route for these symptoms.",
        symptoms.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_mentions_symptoms_and_budget_of_hops() {
        let text = no_match_explanation(&["Chest Pain".to_string()], 4);
        assert!(text.contains("Chest Pain"));
        assert!(text.contains("4 hops"));

        let empty = no_match_explanation(&[], 4);
        assert!(empty.contains("No symptoms"));
    }
}
