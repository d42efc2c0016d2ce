//! Scoring components and the phase-weighted composite
//!
//! Each component maps a transcript to a value in [0, 1] plus a breakdown of
//! named sub-metrics. Components share no state, so a round's scorers can run
//! concurrently and be combined afterwards.

mod behavioral;
mod composite;
mod keyword;
mod text;

pub use behavioral::{BankrollScorer, CoherenceScorer, IterativeScorer, VarianceScorer};
pub use composite::{
    active_components, combine, combine_strict, effective_weights, CompositeResult,
};
pub use keyword::{MethodologyScorer, TechnicalScorer};

use crate::agents::Transcript;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One independently scored dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Technical,
    Methodology,
    Iterative,
    Bankroll,
    Coherence,
    Variance,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Technical,
        Component::Methodology,
        Component::Iterative,
        Component::Bankroll,
        Component::Coherence,
        Component::Variance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Technical => "technical",
            Component::Methodology => "methodology",
            Component::Iterative => "iterative",
            Component::Bankroll => "bankroll",
            Component::Coherence => "coherence",
            Component::Variance => "variance",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one scoring component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub value: f64,
    pub component: Component,
    /// Sub-metric name to value
    pub details: BTreeMap<String, f64>,
}

impl ScoreResult {
    /// Build a result whose value is the mean of its sub-metrics
    pub fn from_details(component: Component, details: &[(&str, f64)]) -> Self {
        let details: BTreeMap<String, f64> = details
            .iter()
            .map(|(name, value)| (name.to_string(), text::clamp_unit(*value)))
            .collect();
        let value = if details.is_empty() {
            0.0
        } else {
            details.values().sum::<f64>() / details.len() as f64
        };

        Self {
            value,
            component,
            details,
        }
    }

    /// Copy of this result with the value scaled by `k`
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            value: self.value * k,
            ..self.clone()
        }
    }
}

/// A stateless scoring function over a round transcript
#[async_trait]
pub trait Scorer: Send + Sync {
    fn component(&self) -> Component;

    async fn score(&self, transcript: &Transcript, target: &str) -> ScoreResult;
}

/// Settings the behavioral scorers need from the run configuration
#[derive(Debug, Clone, Copy)]
pub struct ScoringSettings {
    pub initial_bankroll: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            initial_bankroll: 100.0,
        }
    }
}

/// The scorers that run in a phase, in `active_components` order
pub fn scorers_for_phase(phase: u32, settings: ScoringSettings) -> Vec<Box<dyn Scorer>> {
    active_components(phase)
        .into_iter()
        .map(|component| scorer_for(component, settings))
        .collect()
}

fn scorer_for(component: Component, settings: ScoringSettings) -> Box<dyn Scorer> {
    match component {
        Component::Technical => Box::new(TechnicalScorer),
        Component::Methodology => Box::new(MethodologyScorer),
        Component::Iterative => Box::new(IterativeScorer),
        Component::Bankroll => Box::new(BankrollScorer::new(settings.initial_bankroll)),
        Component::Coherence => Box::new(CoherenceScorer),
        Component::Variance => Box::new(VarianceScorer),
    }
}
