use crate::scoring::{Component, CompositeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of a round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result of one tournament round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round identifier (`round_{n}`)
    pub round_id: String,
    /// Round number
    pub round: u32,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub completed_at: Option<DateTime<Utc>>,
    /// Duration in milliseconds
    pub duration_ms: Option<u64>,
    /// Status of the round
    pub status: RoundStatus,
    /// Composite score and breakdown if scored
    pub composite: Option<CompositeResult>,
    /// Agent output text
    pub agent_output: Option<String>,
    /// Number of tool calls the agent made
    pub tool_calls: usize,
    /// Error message if failed
    pub error: Option<String>,
}

impl RoundResult {
    pub fn new(round_id: &str, round: u32) -> Self {
        Self {
            round_id: round_id.to_string(),
            round,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            status: RoundStatus::Pending,
            composite: None,
            agent_output: None,
            tool_calls: 0,
            error: None,
        }
    }

    fn stop_clock(&mut self) {
        let completed_at = Utc::now();
        self.duration_ms = Some(
            (completed_at - self.started_at)
                .num_milliseconds()
                .max(0) as u64,
        );
        self.completed_at = Some(completed_at);
    }

    pub fn complete_with_score(&mut self, composite: CompositeResult) {
        self.stop_clock();
        self.composite = Some(composite);
        self.status = RoundStatus::Completed;
    }

    pub fn fail_with_error(&mut self, error: &str) {
        self.stop_clock();
        self.error = Some(error.to_string());
        self.status = RoundStatus::Failed;
    }

    pub fn score(&self) -> Option<f64> {
        self.composite.as_ref().map(|c| c.value)
    }
}

/// Summary statistics for the run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Rounds attempted
    pub total_rounds: u32,
    /// Rounds scored
    pub completed: u32,
    /// Rounds where the agent or scoring failed
    pub failed: u32,
    /// Mean composite over scored rounds
    pub mean_composite: f64,
    /// Mean value per component over scored rounds
    pub component_means: BTreeMap<Component, f64>,
    /// Highest scoring round
    pub best_round: Option<u32>,
    /// Lowest scoring round
    pub worst_round: Option<u32>,
}

/// Complete results of a tournament run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResults {
    /// Evaluation name
    pub name: String,
    /// Unique run ID
    pub run_id: String,
    /// Agent name
    pub agent: String,
    /// Evaluation phase
    pub phase: u32,
    /// Configured round count
    pub rounds: u32,
    /// Run seed
    pub seed: u64,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub completed_at: Option<DateTime<Utc>>,
    /// Per-round results in round order
    pub results: Vec<RoundResult>,
    /// Summary statistics
    pub summary: RunSummary,
}

impl RunResults {
    pub fn new(name: &str, run_id: &str, agent: &str, phase: u32, rounds: u32, seed: u64) -> Self {
        Self {
            name: name.to_string(),
            run_id: run_id.to_string(),
            agent: agent.to_string(),
            phase,
            rounds,
            seed,
            started_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn add_round(&mut self, result: RoundResult) {
        self.results.push(result);
    }

    /// Recompute the summary from the round results
    pub fn calculate_summary(&mut self) {
        let scored: Vec<(u32, &CompositeResult)> = self
            .results
            .iter()
            .filter_map(|r| r.composite.as_ref().map(|c| (r.round, c)))
            .collect();

        let mut summary = RunSummary {
            total_rounds: self.results.len() as u32,
            completed: self
                .results
                .iter()
                .filter(|r| r.status == RoundStatus::Completed)
                .count() as u32,
            failed: self
                .results
                .iter()
                .filter(|r| r.status == RoundStatus::Failed)
                .count() as u32,
            ..Default::default()
        };

        if !scored.is_empty() {
            summary.mean_composite =
                scored.iter().map(|(_, c)| c.value).sum::<f64>() / scored.len() as f64;

            let mut sums: BTreeMap<Component, (f64, u32)> = BTreeMap::new();
            for (_, composite) in &scored {
                for (component, result) in &composite.components {
                    let entry = sums.entry(*component).or_insert((0.0, 0));
                    entry.0 += result.value;
                    entry.1 += 1;
                }
            }
            summary.component_means = sums
                .into_iter()
                .map(|(c, (sum, n))| (c, sum / n as f64))
                .collect();

            let mut ordered = scored.clone();
            ordered.sort_by(|a, b| b.1.value.total_cmp(&a.1.value));
            summary.best_round = ordered.first().map(|(round, _)| *round);
            summary.worst_round = ordered.last().map(|(round, _)| *round);
        }

        self.summary = summary;
    }

    /// Finalize the results
    pub fn finalize(&mut self) {
        self.completed_at = Some(Utc::now());
        self.calculate_summary();
    }

    /// Save results to a JSON file
    pub fn save_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Generate a human-readable report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("# Tournament Report: {}\n\n", self.name));
        report.push_str(&format!("Run ID: {}\n", self.run_id));
        report.push_str(&format!("Agent: {}\n", self.agent));
        report.push_str(&format!(
            "Phase: {} | Rounds: {} | Seed: {}\n",
            self.phase, self.rounds, self.seed
        ));
        report.push_str(&format!("Started: {}\n", self.started_at));
        if let Some(completed) = self.completed_at {
            report.push_str(&format!("Completed: {}\n", completed));
        }
        report.push('\n');

        report.push_str("## Summary\n\n");
        report.push_str(&format!("- Rounds Run: {}\n", self.summary.total_rounds));
        report.push_str(&format!("- Completed: {}\n", self.summary.completed));
        report.push_str(&format!("- Failed: {}\n", self.summary.failed));
        report.push_str(&format!(
            "- Mean Composite: {:.4}\n",
            self.summary.mean_composite
        ));
        if let Some(best) = self.summary.best_round {
            report.push_str(&format!("- Best Round: {}\n", best));
        }
        if let Some(worst) = self.summary.worst_round {
            report.push_str(&format!("- Worst Round: {}\n", worst));
        }
        report.push('\n');

        if !self.summary.component_means.is_empty() {
            report.push_str("## Component Means\n\n");
            report.push_str("| Component | Mean |\n");
            report.push_str("|-----------|------|\n");
            for (component, mean) in &self.summary.component_means {
                report.push_str(&format!("| {} | {:.4} |\n", component, mean));
            }
            report.push('\n');
        }

        report.push_str("## Rounds\n\n");
        report.push_str("| Round | Status | Composite | Tool Calls |\n");
        report.push_str("|-------|--------|-----------|------------|\n");
        for result in &self.results {
            let composite = result
                .score()
                .map(|s| format!("{:.4}", s))
                .unwrap_or_else(|| "-".to_string());
            report.push_str(&format!(
                "| {} | {:?} | {} | {} |\n",
                result.round, result.status, composite, result.tool_calls
            ));
        }

        let failures: Vec<&RoundResult> =
            self.results.iter().filter(|r| r.error.is_some()).collect();
        if !failures.is_empty() {
            report.push_str("\n## Failures\n\n");
            for result in failures {
                if let Some(ref error) = result.error {
                    report.push_str(&format!("- {}: {}\n", result.round_id, error));
                }
            }
        }

        report
    }
}
