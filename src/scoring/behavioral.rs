//! Multi-round behavioral scorers.
//!
//! These read the run history carried in the transcript. With no evidence to
//! work from (first round, no ledger, no training calls) each one reports its
//! fixed baseline breakdown, so early rounds score neutrally instead of zero.

use super::text::{
    clamp_unit, cosine_similarity, count_terms, jaccard, mean, slope, variance, vocabulary,
};
use super::{Component, ScoreResult, Scorer};
use crate::agents::{ToolCallRecord, Transcript};
use async_trait::async_trait;
use std::collections::BTreeSet;

const BANKROLL_TOOL: &str = "update_bankroll";
const TRAINING_TOOL: &str = "train_model";

/// 0.4 with no hits, 0.8 with one, 1.0 with two or more
fn mention_score(hits: usize) -> f64 {
    match hits {
        0 => 0.4,
        1 => 0.8,
        _ => 1.0,
    }
}

/// Prior composites in round order, skipping unscored rounds
fn prior_composites(transcript: &Transcript) -> Vec<f64> {
    transcript
        .history
        .iter()
        .filter_map(|r| r.composite)
        .collect()
}

/// Learning and improvement across rounds
pub struct IterativeScorer;

const LEARNING_TERMS: &[&str] = &[
    "previous round",
    "last round",
    "earlier round",
    "prior round",
    "learned",
    "lesson",
    "last time",
    "improve",
];

const HYPOTHESIS_TERMS: &[&str] = &[
    "hypothesis",
    "experiment",
    "ablation",
    "compare",
    "baseline",
    "test whether",
];

#[async_trait]
impl Scorer for IterativeScorer {
    fn component(&self) -> Component {
        Component::Iterative
    }

    async fn score(&self, transcript: &Transcript, _target: &str) -> ScoreResult {
        let Some(previous) = transcript.previous() else {
            return ScoreResult::from_details(
                Component::Iterative,
                &[
                    ("learning", 0.7),
                    ("adaptation", 0.8),
                    ("hypothesis_testing", 0.6),
                    ("strategy_refinement", 0.7),
                ],
            );
        };

        let output = transcript.output_text();
        let lower = output.to_lowercase();

        let composites = prior_composites(transcript);
        let adaptation = if composites.len() < 2 {
            0.5
        } else {
            0.5 + slope(&composites) * 5.0
        };

        // Peaks when about half the vocabulary is new; verbatim repeats and
        // unrelated rewrites both score low.
        let novelty = 1.0 - jaccard(&vocabulary(output), &vocabulary(&previous.output));
        let strategy_refinement = 1.0 - 2.0 * (novelty - 0.5).abs();

        ScoreResult::from_details(
            Component::Iterative,
            &[
                ("learning", mention_score(count_terms(&lower, LEARNING_TERMS))),
                ("adaptation", adaptation),
                (
                    "hypothesis_testing",
                    mention_score(count_terms(&lower, HYPOTHESIS_TERMS)),
                ),
                ("strategy_refinement", strategy_refinement),
            ],
        )
    }
}

/// Bankroll management and risk control, from the `update_bankroll` ledger
pub struct BankrollScorer {
    initial_bankroll: f64,
}

impl BankrollScorer {
    pub fn new(initial_bankroll: f64) -> Self {
        Self { initial_bankroll }
    }

    fn ledger<'a>(transcript: &'a Transcript) -> impl Iterator<Item = &'a ToolCallRecord> + 'a {
        transcript
            .history
            .iter()
            .flat_map(|r| r.bankroll_calls.iter())
            .chain(transcript.calls_to(BANKROLL_TOOL))
            .filter(|c| c.succeeded())
    }
}

/// Bankroll path metrics over a sequence of payouts
#[derive(Debug, Clone, PartialEq)]
struct BankrollPath {
    final_ratio: f64,
    max_drawdown: f64,
    sharpe: f64,
}

impl BankrollPath {
    fn compute(initial: f64, payouts: &[f64]) -> Self {
        let mut balance = initial;
        let mut peak = initial;
        let mut max_drawdown: f64 = 0.0;
        let mut returns = Vec::with_capacity(payouts.len());

        for payout in payouts {
            returns.push(if balance > 0.0 { payout / balance } else { 0.0 });
            balance += payout;
            peak = peak.max(balance);
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - balance) / peak);
            }
        }

        let sd = variance(&returns).sqrt();
        let sharpe = if returns.len() < 2 || sd < 1e-12 {
            0.0
        } else {
            mean(&returns) / sd
        };

        Self {
            final_ratio: balance / initial,
            max_drawdown,
            sharpe,
        }
    }
}

#[async_trait]
impl Scorer for BankrollScorer {
    fn component(&self) -> Component {
        Component::Bankroll
    }

    async fn score(&self, transcript: &Transcript, _target: &str) -> ScoreResult {
        let payouts: Vec<f64> = Self::ledger(transcript)
            .filter_map(|c| c.arg_f64("payout"))
            .filter(|p| p.is_finite())
            .collect();

        if payouts.is_empty() || self.initial_bankroll <= 0.0 {
            return ScoreResult::from_details(
                Component::Bankroll,
                &[
                    ("final_bankroll", 0.7),
                    ("max_drawdown", 0.6),
                    ("sharpe_ratio", 0.7),
                    ("risk_adjusted_return", 0.6),
                ],
            );
        }

        let path = BankrollPath::compute(self.initial_bankroll, &payouts);
        let total_return = path.final_ratio - 1.0;

        ScoreResult::from_details(
            Component::Bankroll,
            &[
                ("final_bankroll", path.final_ratio / 2.0),
                ("max_drawdown", 1.0 - 2.0 * path.max_drawdown),
                ("sharpe_ratio", 0.5 + path.sharpe / 4.0),
                ("risk_adjusted_return", 0.5 + total_return - path.max_drawdown),
            ],
        )
    }
}

/// Long-horizon memory and consistency
pub struct CoherenceScorer;

#[async_trait]
impl Scorer for CoherenceScorer {
    fn component(&self) -> Component {
        Component::Coherence
    }

    async fn score(&self, transcript: &Transcript, _target: &str) -> ScoreResult {
        let Some(previous) = transcript.previous() else {
            return ScoreResult::from_details(
                Component::Coherence,
                &[
                    ("memory_retention", 0.6),
                    ("strategy_consistency", 0.7),
                    ("decision_coherence", 0.5),
                    ("context_awareness", 0.6),
                ],
            );
        };

        let output = transcript.output_text();
        let lower = output.to_lowercase();

        // Longer words only, to skip filler shared by any two texts
        let prior: BTreeSet<String> = transcript
            .history
            .iter()
            .flat_map(|r| vocabulary(&r.output))
            .filter(|w| w.chars().count() >= 6)
            .collect();
        let memory_retention = if prior.is_empty() {
            0.5
        } else {
            let current = vocabulary(output);
            let recalled = prior.iter().filter(|w| current.contains(*w)).count();
            2.0 * recalled as f64 / prior.len() as f64
        };

        let decision_coherence = if transcript.tool_calls.is_empty() {
            0.5
        } else {
            let ok = transcript.tool_calls.iter().filter(|c| c.succeeded()).count();
            ok as f64 / transcript.tool_calls.len() as f64
        };

        let round = transcript.round();
        let context_awareness = if round > 0 && lower.contains(&format!("round {}", round)) {
            1.0
        } else if lower.contains("round") {
            0.7
        } else {
            0.3
        };

        ScoreResult::from_details(
            Component::Coherence,
            &[
                ("memory_retention", memory_retention),
                (
                    "strategy_consistency",
                    cosine_similarity(output, &previous.output),
                ),
                ("decision_coherence", decision_coherence),
                ("context_awareness", context_awareness),
            ],
        )
    }
}

/// Reproducibility and run-to-run stability
pub struct VarianceScorer;

#[async_trait]
impl Scorer for VarianceScorer {
    fn component(&self) -> Component {
        Component::Variance
    }

    async fn score(&self, transcript: &Transcript, _target: &str) -> ScoreResult {
        let training: Vec<&ToolCallRecord> = transcript.calls_to(TRAINING_TOOL).collect();
        let composites = prior_composites(transcript);

        if training.is_empty() && composites.len() < 2 {
            return ScoreResult::from_details(
                Component::Variance,
                &[
                    ("reproducibility", 0.9),
                    ("stability", 0.8),
                    ("variance", 0.7),
                    ("seed_control", 0.8),
                ],
            );
        }

        let (reproducibility, seed_control) = if training.is_empty() {
            (0.5, 0.5)
        } else {
            let total = training.len() as f64;
            let seeded = training.iter().filter(|c| c.arg_u64("seed").is_some()).count();
            let pinned = match transcript.metadata.seed {
                Some(run_seed) => training
                    .iter()
                    .filter(|c| c.arg_u64("seed") == Some(run_seed))
                    .count(),
                None => seeded,
            };
            (pinned as f64 / total, seeded as f64 / total)
        };

        let (stability, spread) = if composites.len() < 2 {
            (0.5, 0.5)
        } else {
            let var = variance(&composites);
            (1.0 - 4.0 * var.sqrt(), 1.0 - 10.0 * var)
        };

        ScoreResult::from_details(
            Component::Variance,
            &[
                ("reproducibility", clamp_unit(reproducibility)),
                ("stability", stability),
                ("variance", spread),
                ("seed_control", seed_control),
            ],
        )
    }
}
