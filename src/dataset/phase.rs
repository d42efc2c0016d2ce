use serde::{Deserialize, Serialize};
use std::fmt;

/// A single piece of data the agent may be allowed to see in a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    TrainingData,
    ValidationData,
    FeatureMetadata,
    TournamentData,
    MetaModelInfo,
    HistoricalTournaments,
    RegimeLabels,
}

impl Capability {
    /// All capabilities in declaration order
    pub const ALL: [Capability; 7] = [
        Capability::TrainingData,
        Capability::ValidationData,
        Capability::FeatureMetadata,
        Capability::TournamentData,
        Capability::MetaModelInfo,
        Capability::HistoricalTournaments,
        Capability::RegimeLabels,
    ];

    /// Bullet text used when rendering the round prompt
    pub fn description(&self) -> &'static str {
        match self {
            Capability::TrainingData => "Training dataset with features and targets",
            Capability::ValidationData => "Validation dataset for model evaluation",
            Capability::FeatureMetadata => "Feature metadata and descriptions",
            Capability::TournamentData => "Tournament-era data for live predictions",
            Capability::MetaModelInfo => "Meta-model information and ensemble strategies",
            Capability::HistoricalTournaments => {
                "Historical tournament results and performance data"
            }
            Capability::RegimeLabels => "Regime labels for understanding market conditions",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::TrainingData => "training_data",
            Capability::ValidationData => "validation_data",
            Capability::FeatureMetadata => "feature_metadata",
            Capability::TournamentData => "tournament_data",
            Capability::MetaModelInfo => "meta_model_info",
            Capability::HistoricalTournaments => "historical_tournaments",
            Capability::RegimeLabels => "regime_labels",
        };
        write!(f, "{}", name)
    }
}

/// Data visibility for one (round, phase) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub training_data: bool,
    pub validation_data: bool,
    pub feature_metadata: bool,
    pub tournament_data: bool,
    pub meta_model_info: bool,
    pub historical_tournaments: bool,
    pub regime_labels: bool,
}

impl PhaseConfig {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::TrainingData => self.training_data,
            Capability::ValidationData => self.validation_data,
            Capability::FeatureMetadata => self.feature_metadata,
            Capability::TournamentData => self.tournament_data,
            Capability::MetaModelInfo => self.meta_model_info,
            Capability::HistoricalTournaments => self.historical_tournaments,
            Capability::RegimeLabels => self.regime_labels,
        }
    }

    fn grant(&mut self, capability: Capability) {
        let flag = match capability {
            Capability::TrainingData => &mut self.training_data,
            Capability::ValidationData => &mut self.validation_data,
            Capability::FeatureMetadata => &mut self.feature_metadata,
            Capability::TournamentData => &mut self.tournament_data,
            Capability::MetaModelInfo => &mut self.meta_model_info,
            Capability::HistoricalTournaments => &mut self.historical_tournaments,
            Capability::RegimeLabels => &mut self.regime_labels,
        };
        *flag = true;
    }

    /// Granted capabilities in declaration order
    pub fn enabled(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(move |c| self.has(*c))
    }

    pub fn count(&self) -> usize {
        self.enabled().count()
    }

    /// True if every capability granted here is also granted by `other`
    pub fn is_subset_of(&self, other: &PhaseConfig) -> bool {
        self.enabled().all(|c| other.has(c))
    }
}

/// One disclosure bracket: applies when `phase >= min_phase && round <= max_round`
struct Tier {
    min_phase: u32,
    max_round: u32,
    grants: &'static [Capability],
}

const TIERS: [Tier; 4] = [
    Tier {
        min_phase: 1,
        max_round: 10,
        grants: &[Capability::TrainingData, Capability::ValidationData],
    },
    Tier {
        min_phase: 2,
        max_round: 20,
        grants: &[
            Capability::TrainingData,
            Capability::ValidationData,
            Capability::FeatureMetadata,
        ],
    },
    Tier {
        min_phase: 3,
        max_round: 25,
        grants: &[
            Capability::TrainingData,
            Capability::ValidationData,
            Capability::FeatureMetadata,
            Capability::TournamentData,
            Capability::MetaModelInfo,
        ],
    },
    Tier {
        min_phase: 4,
        max_round: 40,
        grants: &Capability::ALL,
    },
];

/// Resolve what data is visible to the agent for a round in a given phase.
///
/// The result is the union of every tier whose guard holds. Rounds past the
/// last bracket (41+) resolve to nothing regardless of phase. Round 0 is not
/// rejected here; callers number rounds from 1.
pub fn resolve(round_num: u32, phase: u32) -> PhaseConfig {
    let mut config = PhaseConfig::default();

    for tier in TIERS.iter() {
        if phase >= tier.min_phase && round_num <= tier.max_round {
            for capability in tier.grants {
                config.grant(*capability);
            }
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_1_basic_data() {
        let config = resolve(5, 1);
        assert!(config.training_data);
        assert!(config.validation_data);
        assert!(!config.feature_metadata);
        assert!(!config.tournament_data);
    }

    #[test]
    fn test_phase_2_adds_feature_metadata() {
        let config = resolve(15, 2);
        assert!(config.training_data);
        assert!(config.validation_data);
        assert!(config.feature_metadata);
        assert!(!config.tournament_data);
    }

    #[test]
    fn test_phase_3_adds_tournament_data() {
        let config = resolve(23, 3);
        assert!(config.feature_metadata);
        assert!(config.tournament_data);
        assert!(config.meta_model_info);
        assert!(!config.historical_tournaments);
    }

    #[test]
    fn test_phase_4_everything() {
        let config = resolve(30, 4);
        assert_eq!(config.count(), Capability::ALL.len());
        assert!(config.historical_tournaments);
        assert!(config.regime_labels);
    }

    #[test]
    fn test_round_past_last_bracket_is_empty() {
        for phase in 1..=4 {
            assert_eq!(resolve(45, phase), PhaseConfig::default());
        }
    }

    #[test]
    fn test_round_past_phase_ceiling_gets_nothing() {
        // Phase 1 only covers rounds up to 10
        assert_eq!(resolve(11, 1).count(), 0);
    }

    #[test]
    fn test_higher_phase_never_revokes() {
        for round in 1..=45 {
            for phase in 1..4 {
                let lower = resolve(round, phase);
                let higher = resolve(round, phase + 1);
                assert!(
                    lower.is_subset_of(&higher),
                    "round {} phase {} lost capabilities",
                    round,
                    phase
                );
            }
        }
    }

    #[test]
    fn test_strictly_more_within_bracket() {
        // Round 5 is inside every bracket, so each phase unlocks something new
        for phase in 1..4 {
            assert!(resolve(5, phase).count() < resolve(5, phase + 1).count());
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        assert_eq!(resolve(12, 3), resolve(12, 3));
    }

    #[test]
    fn test_enabled_follows_declaration_order() {
        let caps: Vec<Capability> = resolve(1, 3).enabled().collect();
        assert_eq!(
            caps,
            vec![
                Capability::TrainingData,
                Capability::ValidationData,
                Capability::FeatureMetadata,
                Capability::TournamentData,
                Capability::MetaModelInfo,
            ]
        );
    }
}
