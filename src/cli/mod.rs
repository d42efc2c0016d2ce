mod args;
mod config;

pub use args::{Args, Command, DatasetArgs, InitArgs, InspectArgs, RunArgs};
pub use config::{AgentSettings, EvalConfig, EvalSettings, FailurePolicy, TaskSettings};
