use crate::agents::{AgentExecutor, CommandAgent, ReplayAgent};
use crate::error::EvalError;
use crate::scoring::ScoringSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for an evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Name of this evaluation
    pub name: String,

    /// Description of the evaluation
    #[serde(default)]
    pub description: String,

    /// Tournament shape
    #[serde(default)]
    pub task: TaskSettings,

    /// Agent to evaluate
    pub agent: AgentSettings,

    /// Global settings
    #[serde(default)]
    pub settings: EvalSettings,
}

/// Rounds, phase and seed of the simulated tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSettings {
    /// Number of tournament rounds
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Evaluation phase (1-4)
    #[serde(default = "default_phase")]
    pub phase: u32,

    /// Seed for reproducibility
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum tool calls per round
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            phase: default_phase(),
            seed: default_seed(),
            max_steps: default_max_steps(),
        }
    }
}

fn default_rounds() -> u32 {
    10
}

fn default_phase() -> u32 {
    1
}

fn default_seed() -> u64 {
    42
}

fn default_max_steps() -> u32 {
    50
}

/// Supported agent collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AgentSettings {
    /// Replay a recorded JSON-lines transcript
    Replay {
        /// Path to the recording
        path: PathBuf,
    },
    /// Spawn an external agent process per round
    Command {
        /// Command to run
        command: String,
        /// Arguments
        #[serde(default)]
        args: Vec<String>,
        /// Per-round timeout in seconds
        #[serde(default = "default_agent_timeout")]
        timeout_secs: u64,
    },
}

fn default_agent_timeout() -> u64 {
    1800
}

impl AgentSettings {
    /// Build the configured executor
    pub fn build(&self) -> Result<Arc<dyn AgentExecutor>> {
        match self {
            AgentSettings::Replay { path } => {
                let agent = ReplayAgent::from_jsonl(path)
                    .context(format!("Failed to load agent recording: {:?}", path))?;
                Ok(Arc::new(agent))
            }
            AgentSettings::Command {
                command,
                args,
                timeout_secs,
            } => Ok(Arc::new(CommandAgent::new(
                command,
                args.clone(),
                Duration::from_secs(*timeout_secs),
            ))),
        }
    }
}

/// What to do when the agent fails on a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run at the first failed round
    Abort,
    /// Record the failure and continue with the next round
    Skip,
}

/// Global evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSettings {
    /// Output directory for results
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Behaviour when an agent execution fails
    #[serde(default = "default_failure_policy")]
    pub on_round_failure: FailurePolicy,

    /// Starting bankroll for the bankroll scorer, in NMR
    #[serde(default = "default_bankroll")]
    pub initial_bankroll: f64,

    /// Treat missing components or unknown phases as errors when aggregating
    #[serde(default)]
    pub strict_scoring: bool,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            on_round_failure: default_failure_policy(),
            initial_bankroll: default_bankroll(),
            strict_scoring: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./eval-results")
}

fn default_failure_policy() -> FailurePolicy {
    FailurePolicy::Abort
}

fn default_bankroll() -> f64 {
    100.0
}

impl EvalSettings {
    pub fn scoring(&self) -> ScoringSettings {
        ScoringSettings {
            initial_bankroll: self.initial_bankroll,
        }
    }
}

impl EvalConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EvalConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Reject configurations that cannot produce a run
    pub fn validate(&self) -> std::result::Result<(), EvalError> {
        if self.task.rounds < 1 {
            return Err(EvalError::InvalidConfig(format!(
                "rounds must be at least 1, got {}",
                self.task.rounds
            )));
        }
        if !(1..=4).contains(&self.task.phase) {
            return Err(EvalError::InvalidConfig(format!(
                "phase must be between 1 and 4, got {}",
                self.task.phase
            )));
        }
        if self.task.max_steps == 0 {
            return Err(EvalError::InvalidConfig(
                "max_steps must be greater than 0".to_string(),
            ));
        }
        if self.settings.initial_bankroll.is_nan() || self.settings.initial_bankroll <= 0.0 {
            return Err(EvalError::InvalidConfig(format!(
                "initial_bankroll must be positive, got {}",
                self.settings.initial_bankroll
            )));
        }
        Ok(())
    }

    /// Generate a sample configuration
    pub fn sample() -> Self {
        Self {
            name: "Sample Tournament".to_string(),
            description: "Ten phase-1 rounds replayed from a recorded agent".to_string(),
            task: TaskSettings::default(),
            agent: AgentSettings::Replay {
                path: PathBuf::from("./recordings/agent.jsonl"),
            },
            settings: EvalSettings::default(),
        }
    }
}
