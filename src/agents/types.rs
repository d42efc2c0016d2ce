use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tool invocation made by the agent during a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool name
    pub tool: String,
    /// Arguments passed to the tool
    #[serde(default)]
    pub args: serde_json::Value,
    /// Tool response if the call succeeded
    #[serde(default)]
    pub result: Option<String>,
    /// Error message if the call failed
    #[serde(default)]
    pub error: Option<String>,
}

impl ToolCallRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Read a numeric argument, accepting integers and floats
    pub fn arg_f64(&self, key: &str) -> Option<f64> {
        self.args.get(key).and_then(|v| v.as_f64())
    }

    pub fn arg_u64(&self, key: &str) -> Option<u64> {
        self.args.get(key).and_then(|v| v.as_u64())
    }
}

/// Round-level metadata attached to a transcript. All fields are optional
/// so a partially populated transcript still scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub phase: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Anything else the agent runtime wants to report
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// What happened in an earlier round, as seen by later rounds' scorers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorRound {
    pub round: u32,
    pub output: String,
    /// Composite score of that round, if it was scored
    pub composite: Option<f64>,
    /// `update_bankroll` calls made during that round
    #[serde(default)]
    pub bankroll_calls: Vec<ToolCallRecord>,
}

/// The record of an agent's run on one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Final completion text
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub metadata: TranscriptMetadata,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    /// Earlier rounds of the same run, oldest first
    #[serde(default)]
    pub history: Vec<PriorRound>,
}

impl Transcript {
    pub fn from_output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Default::default()
        }
    }

    /// Agent output, empty when the agent produced none
    pub fn output_text(&self) -> &str {
        self.output.as_deref().unwrap_or("")
    }

    pub fn metadata(&self) -> &TranscriptMetadata {
        &self.metadata
    }

    /// Originating round number, 0 when unknown
    pub fn round(&self) -> u32 {
        self.metadata.round.unwrap_or(0)
    }

    pub fn calls_to<'a>(&'a self, tool: &'a str) -> impl Iterator<Item = &'a ToolCallRecord> + 'a {
        self.tool_calls.iter().filter(move |c| c.tool == tool)
    }

    pub fn previous(&self) -> Option<&PriorRound> {
        self.history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_output_is_empty() {
        let transcript = Transcript::default();
        assert_eq!(transcript.output_text(), "");
        assert_eq!(transcript.round(), 0);
    }

    #[test]
    fn test_deserialize_sparse_transcript() {
        let transcript: Transcript = serde_json::from_str(r#"{"metadata": {"round": 4}}"#).unwrap();
        assert_eq!(transcript.round(), 4);
        assert!(transcript.tool_calls.is_empty());
    }

    #[test]
    fn test_numeric_args() {
        let call = ToolCallRecord {
            tool: "update_bankroll".to_string(),
            args: serde_json::json!({ "payout": 2, "stake": 1.5 }),
            result: None,
            error: None,
        };
        assert_eq!(call.arg_f64("payout"), Some(2.0));
        assert_eq!(call.arg_f64("stake"), Some(1.5));
        assert_eq!(call.arg_f64("missing"), None);
    }
}
