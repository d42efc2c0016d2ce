mod executor;
mod roles;
mod types;

pub use executor::{AgentExecutor, CommandAgent, RecordedCall, RecordedRound, ReplayAgent};
pub use roles::{agent_configs, AgentRole, SubAgentConfig};
pub use types::{PriorRound, ToolCallRecord, Transcript, TranscriptMetadata};
