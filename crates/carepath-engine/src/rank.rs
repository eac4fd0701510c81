//! Final score aggregation and deterministic ranking.

use crate::config::EngineConfig;
use crate::constraints::Satisfaction;
use crate::semantic::ScoredPath;
use carepath_graph::EntityId;

/// One ranked doctor with its score breakdown and path provenance.
#[derive(Debug, Clone)]
pub struct ScoredDoctor {
    pub doctor: EntityId,
    pub name: String,
    /// Semantic relevance in [0, 1].
    pub relevance: f64,
    /// Constraint satisfaction Ψ with per-dimension margins.
    pub satisfaction: Satisfaction,
    /// `Ψ · relevance`; zero iff either factor is zero.
    pub final_score: f64,
    /// The doctor's paths, descending by softmax weight.
    pub top_paths: Vec<ScoredPath>,
    pub explanation: String,
}

/// Ranked result of one query. `note` carries the no-match explanation when
/// the list is empty.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub ranked: Vec<ScoredDoctor>,
    pub note: Option<String>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Sort descending by final score; ties break by ascending fee, then
/// ascending distance, then doctor name — a total, deterministic order.
/// Unknown fees/distances sort after known ones.
pub(crate) fn rank(scored: &mut Vec<ScoredDoctor>, config: &EngineConfig) {
    scored.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| {
                fee_key(a).total_cmp(&fee_key(b))
            })
            .then_with(|| distance_key(a).total_cmp(&distance_key(b)))
            .then_with(|| a.name.cmp(&b.name))
    });

    if !config.include_unsatisfied {
        scored.retain(|d| d.final_score > 0.0);
    }
    if let Some(top_k) = config.top_k {
        scored.truncate(top_k);
    }
}

fn fee_key(d: &ScoredDoctor) -> f64 {
    d.satisfaction.fee.unwrap_or(f64::INFINITY)
}

fn distance_key(d: &ScoredDoctor) -> f64 {
    d.satisfaction.distance_km.unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carepath_graph::{EntityKind, EntityRecord, KnowledgeGraph};

    fn any_id() -> EntityId {
        let graph = KnowledgeGraph::build(
            vec![EntityRecord::new(EntityKind::Doctor, "placeholder")],
            vec![],
        )
        .unwrap();
        graph.resolve(EntityKind::Doctor, "placeholder").unwrap()
    }

    fn doctor(name: &str, final_score: f64, fee: Option<f64>, distance: Option<f64>) -> ScoredDoctor {
        ScoredDoctor {
            doctor: any_id(),
            name: name.to_string(),
            relevance: final_score,
            satisfaction: Satisfaction {
                total: 1.0,
                cost: 1.0,
                geo: 1.0,
                insurance: 1.0,
                fee,
                distance_km: distance,
                insurance_matched: None,
            },
            final_score,
            top_paths: Vec::new(),
            explanation: String::new(),
        }
    }

    #[test]
    fn orders_by_score_then_fee_then_distance_then_name() {
        let mut scored = vec![
            doctor("D", 0.5, Some(100.0), Some(5.0)),
            doctor("C", 0.5, Some(100.0), Some(2.0)),
            doctor("B", 0.5, Some(50.0), Some(9.0)),
            doctor("A", 0.9, Some(500.0), None),
            doctor("E", 0.5, Some(100.0), Some(5.0)),
        ];
        rank(&mut scored, &EngineConfig::default());
        let names: Vec<&str> = scored.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn unknown_fee_sorts_after_known() {
        let mut scored = vec![
            doctor("A", 0.5, None, None),
            doctor("B", 0.5, Some(900.0), None),
        ];
        rank(&mut scored, &EngineConfig::default());
        assert_eq!(scored[0].name, "B");
    }

    #[test]
    fn zero_scores_are_kept_last_by_default_and_filterable() {
        let mut scored = vec![
            doctor("A", 0.0, Some(10.0), None),
            doctor("B", 0.2, Some(90.0), None),
        ];
        rank(&mut scored, &EngineConfig::default());
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[1].name, "A");

        let config = EngineConfig {
            include_unsatisfied: false,
            ..Default::default()
        };
        rank(&mut scored, &config);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].name, "B");
    }

    #[test]
    fn top_k_truncates() {
        let mut scored = vec![
            doctor("A", 0.9, None, None),
            doctor("B", 0.8, None, None),
            doctor("C", 0.7, None, None),
        ];
        let config = EngineConfig {
            top_k: Some(2),
            ..Default::default()
        };
        rank(&mut scored, &config);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[1].name, "B");
    }
}
