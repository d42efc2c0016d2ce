use crate::tools::{phase_tools, Tool, ToolSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Specialised sub-agent a coordinating agent can delegate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Exploratory analysis, feature engineering, data quality
    Data,
    /// Model selection, tuning, training and evaluation
    Model,
    /// Submission timing, stake sizing and risk management
    Submission,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [AgentRole::Data, AgentRole::Model, AgentRole::Submission];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Data => "data",
            AgentRole::Model => "model",
            AgentRole::Submission => "submission",
        }
    }

    pub fn specialization(&self) -> &'static str {
        match self {
            AgentRole::Data => "data_exploration",
            AgentRole::Model => "model_development",
            AgentRole::Submission => "submission_strategy",
        }
    }

    /// Step budget for one delegation
    pub fn max_steps(&self) -> u32 {
        match self {
            AgentRole::Data => 20,
            AgentRole::Model => 30,
            AgentRole::Submission => 15,
        }
    }

    /// Tools the role may use, in order, when the phase provides them
    fn tool_names(&self) -> &'static [&'static str] {
        match self {
            AgentRole::Data => &["load_numerai_data", "write_note", "store_memory"],
            AgentRole::Model => &["train_model", "store_kv", "store_memory"],
            AgentRole::Submission => &["simulate_submission", "update_bankroll"],
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A role with its slice of the phase tool set
#[derive(Debug)]
pub struct SubAgentConfig {
    pub role: AgentRole,
    pub tools: ToolSet,
    pub max_steps: u32,
}

/// Split the tool set of `phase` between the three roles.
///
/// All configs draw from one `phase_tools` set, so a tool given to two roles
/// (vector memory at phase 4) is the same instance and its state is shared.
pub fn agent_configs(phase: u32) -> Vec<SubAgentConfig> {
    let tools = phase_tools(phase);

    AgentRole::ALL
        .into_iter()
        .map(|role| {
            let owned: Vec<Arc<dyn Tool>> = role
                .tool_names()
                .iter()
                .filter_map(|name| tools.get(name))
                .collect();
            SubAgentConfig {
                role,
                tools: ToolSet::new(owned),
                max_steps: role.max_steps(),
            }
        })
        .collect()
}
