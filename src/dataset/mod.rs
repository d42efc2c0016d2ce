//! Round assembly: data visibility per phase, prompt rendering, round records

mod phase;
mod prompt;
mod rounds;

pub use phase::{resolve, Capability, PhaseConfig};
pub use prompt::{render, target};
pub use rounds::{Dataset, Round, RoundMetadata};
