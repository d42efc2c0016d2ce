//! Phased tournament evaluation for data science agents.
//!
//! Rounds are assembled with phase-dependent data visibility, run through an
//! agent with a phase-dependent tool set, and scored on independent
//! components combined into one weighted composite per round.

pub mod agents;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod scoring;
pub mod tools;

pub use error::{EvalError, Result};
