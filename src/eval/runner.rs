use crate::agents::{AgentExecutor, PriorRound, Transcript};
use crate::cli::{EvalConfig, FailurePolicy};
use crate::dataset::{Dataset, Round};
use crate::error::Result;
use crate::eval::{RoundResult, RoundStatus, RunResults};
use crate::scoring::{combine, combine_strict, scorers_for_phase, CompositeResult, ScoringSettings};
use crate::tools::phase_tools;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Run every phase-applicable scorer over a transcript and combine the results.
///
/// Scorers share no state, so they are polled concurrently.
pub async fn score_transcript(
    phase: u32,
    transcript: &Transcript,
    target: &str,
    settings: ScoringSettings,
    strict: bool,
) -> Result<CompositeResult> {
    let scorers = scorers_for_phase(phase, settings);
    let scores = join_all(scorers.iter().map(|s| s.score(transcript, target))).await;

    let results: BTreeMap<_, _> = scores.into_iter().map(|r| (r.component, r)).collect();
    for (component, result) in &results {
        debug!("Round {} {} = {:.4}", transcript.round(), component, result.value);
    }

    let composite = if strict {
        combine_strict(phase, results)?
    } else {
        combine(phase, results)
    };

    Ok(composite.with_round(transcript.round()))
}

/// Orchestrates a tournament run: rounds in, one composite per round out
pub struct TaskRunner {
    config: EvalConfig,
    dataset: Dataset,
    agent: Arc<dyn AgentExecutor>,
    results: Arc<Mutex<RunResults>>,
}

impl TaskRunner {
    /// Create a new TaskRunner. Invalid configuration is rejected here,
    /// before any round runs.
    pub fn new(config: EvalConfig, agent: Arc<dyn AgentExecutor>) -> Result<Self> {
        config.validate()?;
        let dataset = Dataset::build(config.task.rounds, config.task.phase, config.task.seed)?;

        let run_id = Uuid::new_v4().to_string();
        let results = Arc::new(Mutex::new(RunResults::new(
            &config.name,
            &run_id,
            agent.name(),
            config.task.phase,
            config.task.rounds,
            config.task.seed,
        )));

        Ok(Self {
            config,
            dataset,
            agent,
            results,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run all rounds in order.
    ///
    /// Rounds run sequentially since the agent may carry state between them.
    /// An agent failure fails its round; under `FailurePolicy::Abort` the run
    /// stops and the error is returned, with the partial results kept.
    pub async fn run(&self) -> Result<RunResults> {
        let run_id = {
            let results = self.results.lock().await;
            results.run_id.clone()
        };

        info!(
            "Starting tournament: {} (ID: {}, phase {}, {} rounds, seed {})",
            self.config.name,
            run_id,
            self.config.task.phase,
            self.dataset.len(),
            self.config.task.seed
        );

        let mut history: Vec<PriorRound> = Vec::new();

        for round in &self.dataset {
            let mut result = RoundResult::new(&round.id, round.metadata.round);
            result.status = RoundStatus::Running;

            match self.run_round(round, &history).await {
                Ok((transcript, composite)) => {
                    info!(
                        "Round {} completed with composite {:.4}",
                        round.metadata.round, composite.value
                    );
                    history.push(PriorRound {
                        round: round.metadata.round,
                        output: transcript.output_text().to_string(),
                        composite: Some(composite.value),
                        bankroll_calls: transcript.calls_to("update_bankroll").cloned().collect(),
                    });
                    result.agent_output = transcript.output;
                    result.tool_calls = transcript.tool_calls.len();
                    result.complete_with_score(composite);
                    self.results.lock().await.add_round(result);
                }
                Err(e) => {
                    error!("Round {} failed: {}", round.metadata.round, e);
                    result.fail_with_error(&e.to_string());
                    self.results.lock().await.add_round(result);

                    if self.config.settings.on_round_failure == FailurePolicy::Abort {
                        warn!("Aborting run {} after round {}", run_id, round.metadata.round);
                        self.results.lock().await.finalize();
                        return Err(e);
                    }
                }
            }
        }

        let mut final_results = self.results.lock().await;
        final_results.finalize();

        Ok(final_results.clone())
    }

    async fn run_round(
        &self,
        round: &Round,
        history: &[PriorRound],
    ) -> Result<(Transcript, CompositeResult)> {
        let phase = round.metadata.phase;
        let tools = phase_tools(phase);

        info!(
            "Running {} with {} tools: {:?}",
            round.id,
            tools.len(),
            tools.names()
        );

        let mut transcript = self
            .agent
            .execute(&round.input, &tools, self.config.task.max_steps)
            .await?;

        transcript.metadata.round = Some(round.metadata.round);
        transcript.metadata.phase = Some(phase);
        transcript.metadata.seed = Some(round.metadata.seed);
        transcript.history = history.to_vec();

        let composite = score_transcript(
            phase,
            &transcript,
            &round.target,
            self.config.settings.scoring(),
            self.config.settings.strict_scoring,
        )
        .await?;

        Ok((transcript, composite))
    }

    /// Get the current results
    pub async fn results(&self) -> RunResults {
        self.results.lock().await.clone()
    }

    /// Save results to the output directory
    pub async fn save_results(&self, output_dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(output_dir)?;

        let results = self.results.lock().await;

        // Save JSON results
        let json_path = output_dir.join(format!("{}.json", results.run_id));
        results.save_json(&json_path)?;
        info!("Saved results to {:?}", json_path);

        // Save markdown report
        let report_path = output_dir.join(format!("{}_report.md", results.run_id));
        let report = results.generate_report();
        std::fs::write(&report_path, report)?;
        info!("Saved report to {:?}", report_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{RecordedCall, RecordedRound, ReplayAgent};
    use crate::cli::AgentSettings;
    use crate::error::EvalError;
    use serde_json::json;
    use std::path::PathBuf;

    fn config(rounds: u32, phase: u32, policy: FailurePolicy) -> EvalConfig {
        let mut config = EvalConfig::sample();
        config.task.rounds = rounds;
        config.task.phase = phase;
        config.agent = AgentSettings::Replay {
            path: PathBuf::from("unused.jsonl"),
        };
        config.settings.on_round_failure = policy;
        config
    }

    fn output(text: &str) -> RecordedRound {
        RecordedRound {
            output: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_score_transcript_phase_gating() {
        let transcript = Transcript::from_output("load data");
        let early = score_transcript(1, &transcript, "", ScoringSettings::default(), false)
            .await
            .unwrap();
        assert_eq!(early.components.len(), 4);

        let late = score_transcript(4, &transcript, "", ScoringSettings::default(), true)
            .await
            .unwrap();
        assert_eq!(late.components.len(), 6);
        assert_eq!(late.phase, 4);
    }

    #[tokio::test]
    async fn test_run_scores_every_round() {
        let agent = ReplayAgent::new(vec![
            output("Round 1: load the data and train a model"),
            output("Round 2: last round's model improved, evaluate on validation"),
            output("Round 3: compare against the previous round"),
        ]);
        let runner = TaskRunner::new(config(3, 2, FailurePolicy::Abort), Arc::new(agent)).unwrap();

        let results = runner.run().await.unwrap();
        assert_eq!(results.results.len(), 3);
        assert_eq!(results.summary.completed, 3);
        for (i, round) in results.results.iter().enumerate() {
            let composite = round.composite.as_ref().unwrap();
            assert_eq!(composite.round, i as u32 + 1);
            assert_eq!(composite.phase, 2);
            assert!((0.0..=1.0).contains(&composite.value));
        }
    }

    #[tokio::test]
    async fn test_history_reaches_later_rounds() {
        let bankroll = RecordedCall {
            tool: "update_bankroll".to_string(),
            args: json!({ "round_num": 1, "payout": 10.0, "stake": 20.0 }),
        };
        let agent = ReplayAgent::new(vec![
            RecordedRound {
                output: Some("staked".to_string()),
                tool_calls: vec![bankroll],
                error: None,
            },
            output("held"),
        ]);
        let runner = TaskRunner::new(config(2, 2, FailurePolicy::Abort), Arc::new(agent)).unwrap();

        let results = runner.run().await.unwrap();
        let second = results.results[1].composite.as_ref().unwrap();
        let bankroll = &second.components[&crate::scoring::Component::Bankroll];
        // Ledger from round 1 is carried forward: 110 / 100 / 2
        assert!((bankroll.details["final_bankroll"] - 0.55).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_abort_policy_stops_run() {
        let agent = ReplayAgent::new(vec![
            output("fine"),
            RecordedRound {
                error: Some("rate limited".to_string()),
                ..Default::default()
            },
            output("never reached"),
        ]);
        let runner = TaskRunner::new(config(3, 1, FailurePolicy::Abort), Arc::new(agent)).unwrap();

        let err = runner.run().await.unwrap_err();
        assert!(matches!(err, EvalError::Agent(_)));

        let partial = runner.results().await;
        assert_eq!(partial.results.len(), 2);
        assert_eq!(partial.summary.failed, 1);
    }

    #[tokio::test]
    async fn test_skip_policy_continues() {
        let agent = ReplayAgent::new(vec![
            RecordedRound {
                error: Some("rate limited".to_string()),
                ..Default::default()
            },
            output("second"),
        ]);
        let runner = TaskRunner::new(config(2, 1, FailurePolicy::Skip), Arc::new(agent)).unwrap();

        let results = runner.run().await.unwrap();
        assert_eq!(results.summary.failed, 1);
        assert_eq!(results.summary.completed, 1);
        assert_eq!(results.results[0].status, RoundStatus::Failed);
    }

    #[test]
    fn test_invalid_config_rejected_before_running() {
        let agent = Arc::new(ReplayAgent::new(vec![]));
        assert!(TaskRunner::new(config(0, 1, FailurePolicy::Abort), agent.clone()).is_err());
        assert!(TaskRunner::new(config(3, 6, FailurePolicy::Abort), agent).is_err());
    }

    #[tokio::test]
    async fn test_save_results() {
        let dir = tempfile::tempdir().unwrap();
        let agent = ReplayAgent::new(vec![output("only round")]);
        let runner = TaskRunner::new(config(1, 1, FailurePolicy::Abort), Arc::new(agent)).unwrap();
        let results = runner.run().await.unwrap();

        runner.save_results(dir.path()).await.unwrap();
        assert!(dir.path().join(format!("{}.json", results.run_id)).exists());
        assert!(dir
            .path()
            .join(format!("{}_report.md", results.run_id))
            .exists());
    }
}
