use super::phase::{resolve, PhaseConfig};
use super::prompt;
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Round metadata carried alongside the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundMetadata {
    pub round: u32,
    pub phase: u32,
    pub data_config: PhaseConfig,
    pub seed: u64,
}

/// One tournament round handed to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// Stable identifier, `round_{n}`
    pub id: String,
    /// Rendered prompt
    pub input: String,
    /// Expected outcome description
    pub target: String,
    pub metadata: RoundMetadata,
}

impl Round {
    fn new(round_num: u32, phase: u32, seed: u64) -> Self {
        let data_config = resolve(round_num, phase);
        Self {
            id: format!("round_{}", round_num),
            input: prompt::render(round_num, &data_config),
            target: prompt::target(round_num),
            metadata: RoundMetadata {
                round: round_num,
                phase,
                data_config,
                seed,
            },
        }
    }
}

/// Ordered sequence of rounds for a full run
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    rounds: Vec<Round>,
}

impl Dataset {
    /// Assemble rounds `1..=rounds`. Rejects an empty run or a phase outside 1-4.
    pub fn build(rounds: u32, phase: u32, seed: u64) -> Result<Self> {
        if rounds < 1 {
            return Err(EvalError::InvalidConfig(format!(
                "rounds must be at least 1, got {}",
                rounds
            )));
        }
        if !(1..=4).contains(&phase) {
            return Err(EvalError::InvalidConfig(format!(
                "phase must be between 1 and 4, got {}",
                phase
            )));
        }

        let rounds = (1..=rounds)
            .map(|round_num| Round::new(round_num, phase, seed))
            .collect();

        Ok(Self { rounds })
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn get(&self, round_num: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.metadata.round == round_num)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Round> {
        self.rounds.iter()
    }

    /// Write one JSON record per round
    pub fn save_jsonl(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        for round in &self.rounds {
            let line = serde_json::to_string(round)?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    /// Load a previously saved dataset. Blank lines are skipped.
    pub fn load_jsonl(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut rounds = Vec::new();

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rounds.push(serde_json::from_str::<Round>(&line)?);
        }

        if rounds.is_empty() {
            return Err(EvalError::InvalidConfig(format!(
                "dataset file {:?} contains no rounds",
                path
            )));
        }

        Ok(Self { rounds })
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Round;
    type IntoIter = std::slice::Iter<'a, Round>;

    fn into_iter(self) -> Self::IntoIter {
        self.rounds.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_has_ten_rounds() {
        let dataset = Dataset::build(10, 1, 42).unwrap();
        assert_eq!(dataset.len(), 10);
        assert!(dataset.get(15).is_none());

        let first = dataset.get(1).unwrap();
        assert!(first.metadata.data_config.training_data);
        assert!(!first.metadata.data_config.feature_metadata);
    }

    #[test]
    fn test_rounds_are_numbered_and_tagged() {
        let dataset = Dataset::build(3, 2, 123).unwrap();
        for (i, round) in dataset.iter().enumerate() {
            assert_eq!(round.metadata.round, i as u32 + 1);
            assert_eq!(round.id, format!("round_{}", i + 1));
            assert_eq!(round.metadata.phase, 2);
            assert_eq!(round.metadata.seed, 123);
        }
    }

    #[test]
    fn test_various_round_counts() {
        for rounds in [5, 15, 25] {
            assert_eq!(Dataset::build(rounds, 1, 42).unwrap().len(), rounds as usize);
        }
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let err = Dataset::build(0, 1, 42).unwrap_err();
        assert!(matches!(err, EvalError::InvalidConfig(_)));
    }

    #[test]
    fn test_out_of_range_phase_rejected() {
        assert!(Dataset::build(5, 0, 42).is_err());
        assert!(Dataset::build(5, 5, 42).is_err());
    }

    #[test]
    fn test_jsonl_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.jsonl");

        let dataset = Dataset::build(4, 3, 7).unwrap();
        dataset.save_jsonl(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);

        let loaded = Dataset::load_jsonl(&path).unwrap();
        assert_eq!(loaded, dataset);
    }
}
