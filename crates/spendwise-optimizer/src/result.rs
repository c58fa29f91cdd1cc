//! What an optimization run hands back to its caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spendwise_stats::descriptive::DescriptiveStats;

use crate::CrossoverStrategy;

/// Number of trailing best-fitness values considered when judging stability.
const STABILITY_WINDOW: usize = 10;

/// Identifier of the search method that produced a result.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    #[default]
    #[display("genetic_algorithm")]
    GeneticAlgorithm,
}

/// Why the generation loop stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceReason {
    /// Ran all configured generations.
    #[display("max_generations")]
    MaxGenerations,
    /// Best fitness did not improve for `max_stagnant_generations` generations.
    #[display("stagnated")]
    Stagnated,
    /// Best fitness changed by less than `convergence_threshold` between two
    /// successive generations.
    #[display("converged")]
    Converged,
    /// The cancel flag was raised; checked between generations.
    #[display("cancelled")]
    Cancelled,
}

/// Fitness spread of the last evaluated population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&DescriptiveStats> for FitnessSummary {
    fn from(stats: &DescriptiveStats) -> Self {
        Self {
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            std_dev: stats.std_dev,
        }
    }
}

/// Details of how a result was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Scoring strategy (`maximize_roi`, ..., or `parameter_tuning`).
    pub objective: String,
    pub convergence_reason: ConvergenceReason,
    pub best_fitness: f64,
    /// Fitness of the starting point (even split or current parameters).
    pub baseline_fitness: f64,
    /// Best fitness of each evaluated generation.
    pub fitness_history: Vec<f64>,
    pub population_size: usize,
    pub max_generations: usize,
    pub crossover: CrossoverStrategy,
    /// Absent when no chromosome of the final population was evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_population: Option<FitnessSummary>,
    /// Input parameters that were not optimized and are returned unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passthrough_parameters: BTreeMap<String, f64>,
}

/// Outcome of one optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub optimization_method: OptimizationMethod,
    /// Parameter name to chosen value.
    pub optimized_parameters: BTreeMap<String, f64>,
    /// Best fitness minus baseline fitness, never negative.
    pub expected_improvement: f64,
    /// How settled the run ended, in `[0, 1]`.
    pub confidence_score: f64,
    /// Generations actually evaluated.
    pub iterations_used: usize,
    pub metadata: RunMetadata,
}

/// Computes a confidence score in `[0, 1]` for a finished run.
///
/// Averages two measures of how settled the search is:
///
/// - **History stability**: `1 - CV` of the last ten best-fitness values
/// - **Population consensus**: `1 - CV` of the final population's fitness
///
/// where `CV` is the coefficient of variation, capped at 1. A sample whose mean is
/// zero counts as fully settled when it has no spread and not at all otherwise.
///
/// ```
/// use spendwise_optimizer::confidence_score;
///
/// assert_eq!(confidence_score(&[0.5, 0.5, 0.5], [0.5, 0.5]), 1.0);
/// assert_eq!(confidence_score(&[], []), 0.0);
/// ```
pub fn confidence_score<I>(fitness_history: &[f64], final_fitness: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let tail = &fitness_history[fitness_history.len().saturating_sub(STABILITY_WINDOW)..];
    let stability = settledness(DescriptiveStats::new(tail.iter().copied()));
    let consensus = settledness(DescriptiveStats::new(final_fitness));
    ((stability + consensus) / 2.0).clamp(0.0, 1.0)
}

fn settledness(stats: Option<DescriptiveStats>) -> f64 {
    let Some(stats) = stats else {
        return 0.0;
    };
    match stats.coefficient_of_variation() {
        Some(cv) => 1.0 - cv.min(1.0),
        None if stats.std_dev <= f64::EPSILON => 1.0,
        None => 0.0,
    }
}
