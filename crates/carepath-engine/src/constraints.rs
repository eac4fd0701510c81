//! Symbolic constraint satisfaction over doctor attributes.
//!
//! Each dimension (cost, geography, insurance) yields a score in [0, 1];
//! the joint Ψ combines them per the configured mode. Insurance is a hard
//! veto: an unmet requirement zeroes Ψ in every mode. Cost and geography
//! soften past their thresholds, either linearly or with the smooth
//! sigmoid/Gaussian decays.
//!
//! Doctor data is read from the graph satellites: `ChargesFee → Price`,
//! `LocatedIn → Location`, `AcceptsInsurance → Insurance`. A missing
//! satellite leaves that dimension unconstrained rather than vetoing; the
//! margins record the gap so explanations can name it.

use crate::config::{CombineMode, DecayProfile};
use carepath_graph::{
    EntityId, EntityKind, KnowledgeGraph, RelationKind, ATTR_AMOUNT, ATTR_X, ATTR_Y,
};
use serde::{Deserialize, Serialize};

/// Kilometres per coordinate unit of Euclidean distance.
pub const DISTANCE_SCALE_KM: f64 = 2.0;

/// Sensitivity of the smooth cost decay.
const COST_SIGMOID_ALPHA: f64 = 0.1;
/// Width of the smooth distance decay, in km.
const GEO_GAUSSIAN_SIGMA: f64 = 20.0;

/// User-supplied socio-economic constraints; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub max_budget: Option<f64>,
    /// User position in graph coordinates.
    pub location: Option<(f64, f64)>,
    /// Maximum acceptable distance in km.
    pub max_distance: Option<f64>,
    /// Name of the required `Insurance` entity.
    pub required_insurance: Option<String>,
}

impl ConstraintSet {
    pub fn is_unconstrained(&self) -> bool {
        self.max_budget.is_none()
            && self.location.is_none()
            && self.max_distance.is_none()
            && self.required_insurance.is_none()
    }
}

/// Joint satisfaction Ψ with its per-dimension breakdown and raw margins.
#[derive(Debug, Clone, Serialize)]
pub struct Satisfaction {
    pub total: f64,
    pub cost: f64,
    pub geo: f64,
    pub insurance: f64,
    /// Doctor's fee, when known.
    pub fee: Option<f64>,
    /// Distance to the doctor in km, when both positions are known.
    pub distance_km: Option<f64>,
    /// Whether the required insurance matched; `None` when unconstrained.
    pub insurance_matched: Option<bool>,
}

/// Fee of a doctor via its `Price` satellite.
pub fn doctor_fee(graph: &KnowledgeGraph, doctor: EntityId) -> Option<f64> {
    let price = graph.first_target(doctor, RelationKind::ChargesFee)?;
    graph.number_attr(price, ATTR_AMOUNT)
}

/// Position of a doctor via its `Location` satellite.
pub fn doctor_position(graph: &KnowledgeGraph, doctor: EntityId) -> Option<(f64, f64)> {
    let location = graph.first_target(doctor, RelationKind::LocatedIn)?;
    let x = graph.number_attr(location, ATTR_X)?;
    let y = graph.number_attr(location, ATTR_Y)?;
    Some((x, y))
}

/// Scaled planar distance between two coordinate points, in km.
pub fn distance_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt() * DISTANCE_SCALE_KM
}

/// Evaluate Ψ for one doctor.
pub fn satisfaction(
    graph: &KnowledgeGraph,
    doctor: EntityId,
    constraints: &ConstraintSet,
    decay: DecayProfile,
    combine: CombineMode,
) -> Satisfaction {
    let fee = doctor_fee(graph, doctor);
    let cost = cost_score(constraints.max_budget, fee, decay);

    let position = doctor_position(graph, doctor);
    let distance = match (constraints.location, position) {
        (Some(user), Some(doc)) => Some(distance_km(user, doc)),
        _ => None,
    };
    let geo = geo_score(distance, constraints.max_distance, decay);

    let (insurance, insurance_matched) =
        insurance_score(graph, doctor, constraints.required_insurance.as_deref());

    let total = match combine {
        CombineMode::Product => cost * geo * insurance,
        CombineMode::WeightedSum {
            cost: w_cost,
            geo: w_geo,
        } => {
            let weight_sum = w_cost + w_geo;
            let blended = if weight_sum > 0.0 {
                (w_cost * cost + w_geo * geo) / weight_sum
            } else {
                (cost + geo) / 2.0
            };
            insurance * blended
        }
    };

    Satisfaction {
        total: total.clamp(0.0, 1.0),
        cost,
        geo,
        insurance,
        fee,
        distance_km: distance,
        insurance_matched,
    }
}

fn cost_score(budget: Option<f64>, fee: Option<f64>, decay: DecayProfile) -> f64 {
    let (Some(budget), Some(fee)) = (budget, fee) else {
        return 1.0;
    };
    match decay {
        DecayProfile::Linear => {
            if fee <= budget {
                1.0
            } else if budget > 0.0 {
                (1.0 - (fee - budget) / budget).max(0.0)
            } else {
                0.0
            }
        }
        DecayProfile::Smooth => {
            (1.0 / (1.0 + (COST_SIGMOID_ALPHA * (fee - budget)).exp())).clamp(0.0, 1.0)
        }
    }
}

fn geo_score(distance: Option<f64>, max_distance: Option<f64>, decay: DecayProfile) -> f64 {
    let Some(distance) = distance else {
        return 1.0;
    };
    match decay {
        DecayProfile::Linear => {
            let Some(max_distance) = max_distance else {
                return 1.0;
            };
            if max_distance > 0.0 {
                (1.0 - distance / max_distance).clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
        // The Gaussian needs no cutoff; max_distance only shapes the margin
        // reported to explanations.
        DecayProfile::Smooth => {
            (-(distance * distance) / (2.0 * GEO_GAUSSIAN_SIGMA * GEO_GAUSSIAN_SIGMA))
                .exp()
                .clamp(0.0, 1.0)
        }
    }
}

fn insurance_score(
    graph: &KnowledgeGraph,
    doctor: EntityId,
    required: Option<&str>,
) -> (f64, Option<bool>) {
    let Some(required) = required else {
        return (1.0, None);
    };
    let Some(required_id) = graph.resolve(EntityKind::Insurance, required) else {
        // The required network is not in the graph at all: no doctor can
        // match it.
        return (0.0, Some(false));
    };
    let accepted = graph
        .targets(doctor, RelationKind::AcceptsInsurance)
        .contains(&required_id);
    (if accepted { 1.0 } else { 0.0 }, Some(accepted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use carepath_graph::{EdgeRecord, EntityRecord};

    fn doctor_graph() -> (KnowledgeGraph, EntityId) {
        let graph = KnowledgeGraph::build(
            vec![
                EntityRecord::new(EntityKind::Doctor, "A"),
                EntityRecord::new(EntityKind::Price, "A/fee").with_attr(ATTR_AMOUNT, 100.0),
                EntityRecord::new(EntityKind::Location, "A/loc")
                    .with_attr(ATTR_X, 3.0)
                    .with_attr(ATTR_Y, 4.0),
                EntityRecord::new(EntityKind::Insurance, "Basic"),
                EntityRecord::new(EntityKind::Insurance, "Gold"),
            ],
            vec![
                EdgeRecord::new(RelationKind::ChargesFee, "A", "A/fee"),
                EdgeRecord::new(RelationKind::LocatedIn, "A", "A/loc"),
                EdgeRecord::new(RelationKind::AcceptsInsurance, "A", "Basic"),
            ],
        )
        .unwrap();
        let a = graph.resolve(EntityKind::Doctor, "A").unwrap();
        (graph, a)
    }

    #[test]
    fn within_budget_is_fully_satisfied() {
        let (graph, a) = doctor_graph();
        let constraints = ConstraintSet {
            max_budget: Some(150.0),
            ..Default::default()
        };
        let psi = satisfaction(
            &graph,
            a,
            &constraints,
            DecayProfile::Linear,
            CombineMode::Product,
        );
        assert_eq!(psi.cost, 1.0);
        assert_eq!(psi.total, 1.0);
        assert_eq!(psi.fee, Some(100.0));
    }

    #[test]
    fn over_budget_decays_linearly_to_zero() {
        let (graph, a) = doctor_graph();
        // fee 100, budget 50: 1 − (100−50)/50 = 0.
        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet {
                max_budget: Some(50.0),
                ..Default::default()
            },
            DecayProfile::Linear,
            CombineMode::Product,
        );
        assert_eq!(psi.cost, 0.0);
        assert_eq!(psi.total, 0.0);

        // fee 100, budget 80: 1 − 20/80 = 0.75.
        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet {
                max_budget: Some(80.0),
                ..Default::default()
            },
            DecayProfile::Linear,
            CombineMode::Product,
        );
        assert_relative_eq!(psi.cost, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn smooth_cost_decay_matches_sigmoid() {
        let (graph, a) = doctor_graph();
        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet {
                max_budget: Some(60.0),
                ..Default::default()
            },
            DecayProfile::Smooth,
            CombineMode::Product,
        );
        // 1/(1 + e^(0.1·(100−60))).
        assert_relative_eq!(psi.cost, 1.0 / (1.0 + 4.0f64.exp()), epsilon = 1e-12);
    }

    #[test]
    fn geography_decays_with_distance() {
        let (graph, a) = doctor_graph();
        // Doctor at (3,4): distance from origin = 5 units → 10 km.
        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet {
                location: Some((0.0, 0.0)),
                max_distance: Some(40.0),
                ..Default::default()
            },
            DecayProfile::Linear,
            CombineMode::Product,
        );
        assert_eq!(psi.distance_km, Some(10.0));
        assert_relative_eq!(psi.geo, 0.75, epsilon = 1e-12);

        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet {
                location: Some((0.0, 0.0)),
                max_distance: Some(40.0),
                ..Default::default()
            },
            DecayProfile::Smooth,
            CombineMode::Product,
        );
        assert_relative_eq!(psi.geo, (-100.0f64 / 800.0).exp(), epsilon = 1e-12);
    }

    #[test]
    fn insurance_mismatch_vetoes_in_both_modes() {
        let (graph, a) = doctor_graph();
        let constraints = ConstraintSet {
            max_budget: Some(150.0),
            required_insurance: Some("Gold".to_string()),
            ..Default::default()
        };
        for combine in [
            CombineMode::Product,
            CombineMode::WeightedSum { cost: 2.0, geo: 1.0 },
        ] {
            let psi = satisfaction(&graph, a, &constraints, DecayProfile::Linear, combine);
            assert_eq!(psi.insurance, 0.0);
            assert_eq!(psi.total, 0.0);
            assert_eq!(psi.insurance_matched, Some(false));
        }
    }

    #[test]
    fn matching_insurance_passes() {
        let (graph, a) = doctor_graph();
        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet {
                required_insurance: Some("Basic".to_string()),
                ..Default::default()
            },
            DecayProfile::Linear,
            CombineMode::Product,
        );
        assert_eq!(psi.insurance, 1.0);
        assert_eq!(psi.total, 1.0);
        assert_eq!(psi.insurance_matched, Some(true));
    }

    #[test]
    fn unconstrained_query_is_fully_satisfied() {
        let (graph, a) = doctor_graph();
        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet::default(),
            DecayProfile::Linear,
            CombineMode::Product,
        );
        assert_eq!(psi.total, 1.0);
        assert_eq!(psi.insurance_matched, None);
    }

    #[test]
    fn weighted_sum_blends_cost_and_geo() {
        let (graph, a) = doctor_graph();
        let psi = satisfaction(
            &graph,
            a,
            &ConstraintSet {
                max_budget: Some(80.0), // cost 0.75
                location: Some((0.0, 0.0)),
                max_distance: Some(20.0), // geo 0.5
                ..Default::default()
            },
            DecayProfile::Linear,
            CombineMode::WeightedSum { cost: 1.0, geo: 3.0 },
        );
        assert_relative_eq!(psi.total, (0.75 + 3.0 * 0.5) / 4.0, epsilon = 1e-12);
    }
}
