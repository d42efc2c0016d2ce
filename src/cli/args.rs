use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MEDALLION-EVAL: multi-round tournament evaluation for data science agents
///
/// Builds phased tournament rounds, runs an agent through them with a
/// phase-dependent tool set, and scores every round on a weighted composite.
#[derive(Parser, Debug)]
#[command(name = "medallion-eval")]
#[command(version = "0.1.0")]
#[command(about = "Run and score agents on a simulated data science tournament")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an evaluation
    Run(RunArgs),

    /// Write the assembled rounds as JSON lines
    Dataset(DatasetArgs),

    /// Show data visibility, tools and scoring weights for a round
    Inspect(InspectArgs),

    /// Generate a sample evaluation config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the evaluation config file (YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override the output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Dry run - print the plan without running the agent
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct DatasetArgs {
    /// Number of rounds
    #[arg(short, long, default_value = "10")]
    pub rounds: u32,

    /// Evaluation phase (1-4)
    #[arg(short, long, default_value = "1")]
    pub phase: u32,

    /// Seed recorded in each round
    #[arg(short, long, default_value = "42")]
    pub seed: u64,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Round number
    #[arg(short, long)]
    pub round: u32,

    /// Evaluation phase (1-4)
    #[arg(short, long, default_value = "1")]
    pub phase: u32,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "eval-config.yaml")]
    pub output: PathBuf,
}
