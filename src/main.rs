use anyhow::Result;
use clap::Parser;
use medallion_eval::agents::agent_configs;
use medallion_eval::cli::{self, Args, Command, EvalConfig};
use medallion_eval::dataset::{resolve, Dataset};
use medallion_eval::eval::{RunResults, TaskRunner};
use medallion_eval::scoring::{active_components, effective_weights};
use medallion_eval::tools::phase_tools;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging; RUST_LOG wins over --verbose
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    let _subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Command::Run(run_args) => {
            run_evaluation(run_args).await?;
        }
        Command::Dataset(dataset_args) => {
            write_dataset(dataset_args)?;
        }
        Command::Inspect(inspect_args) => {
            inspect_round(inspect_args)?;
        }
        Command::Init(init_args) => {
            generate_sample_config(init_args)?;
        }
    }

    Ok(())
}

async fn run_evaluation(args: cli::RunArgs) -> Result<()> {
    info!("Loading evaluation config from {:?}", args.config);

    let config = EvalConfig::load(&args.config)?;

    if args.dry_run {
        let dataset = Dataset::build(config.task.rounds, config.task.phase, config.task.seed)?;
        println!("Dry run mode - the agent will not be invoked");
        println!("\nConfiguration:");
        println!("  Name: {}", config.name);
        println!("  Phase: {}", config.task.phase);
        println!("  Rounds: {}", dataset.len());
        println!("  Seed: {}", config.task.seed);
        println!("  Max steps: {}", config.task.max_steps);
        println!("  Tools: {}", phase_tools(config.task.phase).names().join(", "));
        println!("\nRounds:");
        for round in &dataset {
            let data: Vec<String> = round
                .metadata
                .data_config
                .enabled()
                .map(|c| c.to_string())
                .collect();
            println!("  - {}: [{}]", round.id, data.join(", "));
        }
        return Ok(());
    }

    let agent = config.agent.build()?;
    let output_dir = args
        .output
        .unwrap_or_else(|| config.settings.output_dir.clone());
    let runner = TaskRunner::new(config, agent)?;

    let outcome = runner.run().await;
    let results = runner.results().await;
    print_results(&results);

    // Partial results are saved even when the run was aborted
    let run_dir = output_dir.join(&results.run_id);
    runner.save_results(&run_dir).await?;
    println!("\nResults saved to: {:?}", run_dir);

    if let Err(e) = outcome {
        error!("Run aborted: {}", e);
        return Err(e.into());
    }

    Ok(())
}

fn print_results(results: &RunResults) {
    println!("\n{}", "=".repeat(60));
    println!("TOURNAMENT COMPLETE");
    println!("{}", "=".repeat(60));
    println!("\nSummary:");
    println!("  Rounds run: {}", results.summary.total_rounds);
    println!("  Completed: {}", results.summary.completed);
    println!("  Failed: {}", results.summary.failed);
    println!("  Mean composite: {:.4}", results.summary.mean_composite);

    println!("\nComponent means:");
    for (component, mean) in &results.summary.component_means {
        println!("  {:<12} {:.4}", component, mean);
    }

    println!("\nRounds:");
    for round in &results.results {
        match round.score() {
            Some(score) => println!("  {} - {:.4}", round.round_id, score),
            None => println!(
                "  {} - failed: {}",
                round.round_id,
                round.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

fn write_dataset(args: cli::DatasetArgs) -> Result<()> {
    let dataset = Dataset::build(args.rounds, args.phase, args.seed)?;

    match args.output {
        Some(path) => {
            dataset.save_jsonl(&path)?;
            println!("Wrote {} rounds to {:?}", dataset.len(), path);
        }
        None => {
            for round in &dataset {
                println!("{}", serde_json::to_string(round)?);
            }
        }
    }

    Ok(())
}

fn inspect_round(args: cli::InspectArgs) -> Result<()> {
    if !(1..=4).contains(&args.phase) {
        anyhow::bail!("phase must be between 1 and 4, got {}", args.phase);
    }

    let config = resolve(args.round, args.phase);

    println!("Round {} / phase {}", args.round, args.phase);
    println!("\nData visibility:");
    for capability in medallion_eval::dataset::Capability::ALL {
        let mark = if config.has(capability) { "x" } else { " " };
        println!("  [{}] {}", mark, capability);
    }

    println!("\nTools:");
    for tool in phase_tools(args.phase).iter() {
        println!("  - {}: {}", tool.name(), tool.description());
    }

    println!("\nSub-agents:");
    for sub_agent in agent_configs(args.phase) {
        println!(
            "  - {} ({}, {} steps): {}",
            sub_agent.role,
            sub_agent.role.specialization(),
            sub_agent.max_steps,
            sub_agent.tools.names().join(", ")
        );
    }

    println!("\nScoring:");
    let weights = effective_weights(args.phase);
    for component in active_components(args.phase) {
        let weight = weights
            .iter()
            .find(|(c, _)| *c == component)
            .map(|(_, w)| *w)
            .unwrap_or(0.0);
        println!("  {:<12} weight {:.3}", component, weight);
    }

    Ok(())
}

fn generate_sample_config(args: cli::InitArgs) -> Result<()> {
    let config = EvalConfig::sample();

    config.save(&args.output)?;
    println!("Generated sample config at: {:?}", args.output);

    Ok(())
}
