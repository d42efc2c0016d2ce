use super::{Component, ScoreResult, Scorer};
use crate::agents::Transcript;
use async_trait::async_trait;

const BASELINE: f64 = 0.5;

/// Outputs longer than this read as structured work
const DETAILED_OUTPUT_CHARS: usize = 100;

/// Technical implementation quality: data loading, training, evaluation, structure
pub struct TechnicalScorer;

#[async_trait]
impl Scorer for TechnicalScorer {
    fn component(&self) -> Component {
        Component::Technical
    }

    async fn score(&self, transcript: &Transcript, _target: &str) -> ScoreResult {
        let output = transcript.output_text();
        let lower = output.to_lowercase();

        let data_loading = if lower.contains("load") && lower.contains("data") {
            0.8
        } else {
            BASELINE
        };
        let model_training = if lower.contains("train") && lower.contains("model") {
            0.8
        } else {
            BASELINE
        };
        let evaluation = if lower.contains("evaluate") || lower.contains("validation") {
            0.8
        } else {
            BASELINE
        };
        let code_structure = if output.chars().count() > DETAILED_OUTPUT_CHARS {
            0.7
        } else {
            BASELINE
        };

        ScoreResult::from_details(
            Component::Technical,
            &[
                ("data_loading", data_loading),
                ("model_training", model_training),
                ("evaluation", evaluation),
                ("code_structure", code_structure),
            ],
        )
    }
}

/// Data science methodology: exploration, features, model choice, validation
pub struct MethodologyScorer;

fn keyword_metric(lower: &str, words: &[&str], raised: f64) -> f64 {
    if words.iter().any(|w| lower.contains(w)) {
        raised
    } else {
        BASELINE
    }
}

#[async_trait]
impl Scorer for MethodologyScorer {
    fn component(&self) -> Component {
        Component::Methodology
    }

    async fn score(&self, transcript: &Transcript, _target: &str) -> ScoreResult {
        let lower = transcript.output_text().to_lowercase();

        ScoreResult::from_details(
            Component::Methodology,
            &[
                (
                    "data_exploration",
                    keyword_metric(&lower, &["explore", "eda", "analysis", "distribution"], 0.8),
                ),
                (
                    "feature_engineering",
                    keyword_metric(&lower, &["feature", "engineering", "selection"], 0.7),
                ),
                (
                    "model_selection",
                    keyword_metric(&lower, &["xgboost", "lightgbm", "model", "algorithm"], 0.8),
                ),
                (
                    "validation_strategy",
                    keyword_metric(&lower, &["validation", "cross", "holdout", "split"], 0.8),
                ),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_technical_keywords() {
        let transcript = Transcript::from_output(
            "I will load the data and train a model, then evaluate on the validation set.",
        );
        let result = TechnicalScorer.score(&transcript, "").await;

        assert_eq!(result.details["data_loading"], 0.8);
        assert_eq!(result.details["model_training"], 0.8);
        assert_eq!(result.details["evaluation"], 0.8);
        // 76 characters, not long enough to count as structured
        assert_eq!(result.details["code_structure"], 0.5);
        assert!((result.value - (0.8 * 3.0 + 0.5) / 4.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_technical_requires_both_words() {
        let result = TechnicalScorer
            .score(&Transcript::from_output("load everything"), "")
            .await;
        assert_eq!(result.details["data_loading"], 0.5);
    }

    #[tokio::test]
    async fn test_long_output_counts_as_structured() {
        let output = "x".repeat(DETAILED_OUTPUT_CHARS + 1);
        let result = TechnicalScorer
            .score(&Transcript::from_output(output), "")
            .await;
        assert_eq!(result.details["code_structure"], 0.7);
    }

    #[tokio::test]
    async fn test_empty_output_is_baseline() {
        let result = TechnicalScorer.score(&Transcript::default(), "").await;
        assert_eq!(result.value, 0.5);
        assert_eq!(result.component, Component::Technical);
    }

    #[tokio::test]
    async fn test_methodology_keywords() {
        let transcript = Transcript::from_output(
            "EDA first, then feature selection and an XGBoost with holdout eras.",
        );
        let result = MethodologyScorer.score(&transcript, "").await;

        assert_eq!(result.details["data_exploration"], 0.8);
        assert_eq!(result.details["feature_engineering"], 0.7);
        assert_eq!(result.details["model_selection"], 0.8);
        assert_eq!(result.details["validation_strategy"], 0.8);
        assert!((result.value - 0.775).abs() < 1e-12);
    }
}
