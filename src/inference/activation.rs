//! Raw model output to probabilities.

use crate::config::OutputActivation;
use crate::constants::PROBABILITY_SUM_TOLERANCE;

/// Turn raw model scores into probabilities according to `activation`.
pub fn apply(activation: OutputActivation, scores: Vec<f32>) -> Vec<f32> {
    match activation {
        OutputActivation::None => scores,
        OutputActivation::Softmax => softmax(&scores),
        OutputActivation::Auto if is_distribution(&scores) => scores,
        OutputActivation::Auto => softmax(&scores),
    }
}

/// Whether `scores` already form a probability distribution.
pub fn is_distribution(scores: &[f32]) -> bool {
    if scores.iter().any(|s| !(0.0..=1.0).contains(s)) {
        return false;
    }
    let sum: f32 = scores.iter().sum();
    (sum - 1.0).abs() <= PROBABILITY_SUM_TOLERANCE
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
