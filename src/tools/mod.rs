//! Simulated tournament tools exposed to the agent

mod builtin;
mod registry;

pub use builtin::{
    BusinessSimTool, KvTool, ModelTrainingTool, NumeraiDataTool, ScratchpadTool,
    SubmissionSimulatorTool, VectorMemoryTool,
};
pub use registry::phase_tools;

use crate::error::{EvalError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// A named callable the agent can invoke with JSON arguments
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the accepted arguments
    fn parameters(&self) -> serde_json::Value;

    async fn call(&self, args: serde_json::Value) -> Result<String>;
}

/// Decode tool arguments into a typed struct
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: serde_json::Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| EvalError::tool(tool, format!("invalid arguments: {}", e)))
}

/// Ordered set of tool handles visible to the agent during one round
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name
    pub async fn call(&self, name: &str, args: serde_json::Value) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| EvalError::tool(name, "not available in this phase"))?;
        tool.call(args).await
    }
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
