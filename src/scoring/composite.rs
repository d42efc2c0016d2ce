use super::{Component, ScoreResult};
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Weighted members scaled together
struct WeightGroup {
    scale: f64,
    members: &'static [(Component, f64)],
}

const EARLY_PHASE: &[WeightGroup] = &[
    WeightGroup {
        scale: 0.7,
        members: &[
            (Component::Technical, 0.35),
            (Component::Methodology, 0.35),
            (Component::Iterative, 0.30),
        ],
    },
    WeightGroup {
        scale: 0.3,
        members: &[(Component::Bankroll, 1.0)],
    },
];

const TOURNAMENT_PHASE: &[WeightGroup] = &[WeightGroup {
    scale: 1.0,
    members: &[
        (Component::Technical, 0.25),
        (Component::Methodology, 0.25),
        (Component::Iterative, 0.20),
        (Component::Bankroll, 0.30),
    ],
}];

const LONG_HORIZON_PHASE: &[WeightGroup] = &[WeightGroup {
    scale: 1.0,
    members: &[
        (Component::Technical, 0.20),
        (Component::Methodology, 0.20),
        (Component::Iterative, 0.15),
        (Component::Bankroll, 0.25),
        (Component::Coherence, 0.15),
        (Component::Variance, 0.05),
    ],
}];

fn weight_profile(phase: u32) -> Option<&'static [WeightGroup]> {
    match phase {
        1 | 2 => Some(EARLY_PHASE),
        3 => Some(TOURNAMENT_PHASE),
        4 => Some(LONG_HORIZON_PHASE),
        _ => None,
    }
}

const CORE_COMPONENTS: [Component; 4] = [
    Component::Technical,
    Component::Methodology,
    Component::Iterative,
    Component::Bankroll,
];

const LONG_HORIZON_COMPONENTS: [Component; 2] = [Component::Coherence, Component::Variance];

/// Components that run in a phase
pub fn active_components(phase: u32) -> Vec<Component> {
    let mut components = Vec::new();
    if phase >= 1 {
        components.extend(CORE_COMPONENTS);
    }
    if phase >= 4 {
        components.extend(LONG_HORIZON_COMPONENTS);
    }
    components
}

/// Flattened per-component weights for a phase, empty for an unknown phase
pub fn effective_weights(phase: u32) -> Vec<(Component, f64)> {
    weight_profile(phase)
        .unwrap_or(&[])
        .iter()
        .flat_map(|g| g.members.iter().map(move |(c, w)| (*c, g.scale * w)))
        .collect()
}

/// Final weighted score of a round plus the full component breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub value: f64,
    pub phase: u32,
    pub components: BTreeMap<Component, ScoreResult>,
    pub round: u32,
}

impl CompositeResult {
    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }
}

fn weighted_sum(groups: &[WeightGroup], results: &BTreeMap<Component, ScoreResult>) -> f64 {
    groups
        .iter()
        .map(|group| {
            let inner: f64 = group
                .members
                .iter()
                .filter_map(|(c, w)| results.get(c).map(|r| r.value * w))
                .sum();
            group.scale * inner
        })
        .sum()
}

/// Combine whatever components ran into one score.
///
/// Lenient: a missing component contributes zero and an unknown phase yields
/// 0.0. Both cases are logged.
pub fn combine(phase: u32, results: BTreeMap<Component, ScoreResult>) -> CompositeResult {
    let value = match weight_profile(phase) {
        Some(groups) => {
            for (component, _) in effective_weights(phase) {
                if !results.contains_key(&component) {
                    warn!(
                        "Component {} missing from phase {} composite, counting it as zero",
                        component, phase
                    );
                }
            }
            weighted_sum(groups, &results)
        }
        None => {
            warn!("No weights for phase {}, composite is 0.0", phase);
            0.0
        }
    };

    CompositeResult {
        value,
        phase,
        components: results,
        round: 0,
    }
}

/// Like [`combine`], but an unknown phase or a missing weighted component is an error
pub fn combine_strict(
    phase: u32,
    results: BTreeMap<Component, ScoreResult>,
) -> Result<CompositeResult> {
    let groups = weight_profile(phase).ok_or(EvalError::UnknownPhase(phase))?;

    if let Some((missing, _)) = effective_weights(phase)
        .into_iter()
        .find(|(c, _)| !results.contains_key(c))
    {
        return Err(EvalError::MissingComponent(missing.to_string()));
    }

    Ok(CompositeResult {
        value: weighted_sum(groups, &results),
        phase,
        components: results,
        round: 0,
    })
}
