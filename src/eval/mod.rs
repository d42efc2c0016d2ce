mod results;
mod runner;

pub use results::{RoundResult, RoundStatus, RunResults, RunSummary};
pub use runner::{score_transcript, TaskRunner};
