//! Error types for the evaluation harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Agent execution failed: {0}")]
    Agent(String),

    #[error("Tool {tool} failed: {reason}")]
    Tool { tool: String, reason: String },

    #[error("Missing scoring component: {0}")]
    MissingComponent(String),

    #[error("Unknown phase: {0}")]
    UnknownPhase(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EvalError {
    pub fn tool(tool: &str, reason: impl Into<String>) -> Self {
        EvalError::Tool {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, EvalError>;
