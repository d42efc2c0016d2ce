//! Small text statistics shared by the scorers

use std::collections::{BTreeMap, BTreeSet};

/// Clamp into [0, 1]; NaN counts as zero
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Lower-cased alphanumeric words of at least three characters
pub(crate) fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .map(|w| w.to_lowercase())
}

pub(crate) fn vocabulary(text: &str) -> BTreeSet<String> {
    tokens(text).collect()
}

fn term_frequencies(text: &str) -> BTreeMap<String, f64> {
    let mut counts = BTreeMap::new();
    for token in tokens(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of term-frequency vectors; zero if either side is empty
pub(crate) fn cosine_similarity(a: &str, b: &str) -> f64 {
    let fa = term_frequencies(a);
    let fb = term_frequencies(b);
    if fa.is_empty() || fb.is_empty() {
        return 0.0;
    }

    let dot: f64 = fa
        .iter()
        .filter_map(|(term, x)| fb.get(term).map(|y| x * y))
        .sum();
    let norm_a = fa.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = fb.values().map(|x| x * x).sum::<f64>().sqrt();

    clamp_unit(dot / (norm_a * norm_b))
}

/// Jaccard overlap of two vocabularies; two empty sets are identical
pub(crate) fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Number of distinct phrases from `terms` that occur in lower-cased `text`
pub(crate) fn count_terms(text: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| text.contains(*t)).count()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population variance
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Least-squares slope of `values` against their index
pub(crate) fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let mx = mean(&xs);
    let my = mean(values);
    let num: f64 = xs.iter().zip(values).map(|(x, y)| (x - mx) * (y - my)).sum();
    let den: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    num / den
}
