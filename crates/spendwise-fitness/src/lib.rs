//! Fitness functions: how a candidate set of genes is scored.
//!
//! The optimizer knows nothing about campaigns. It evolves [`Genes`] and asks a
//! [`FitnessEvaluator`] two things about each candidate:
//!
//! 1. **Repair** - bring the genes back onto the feasible set after crossover and
//!    mutation (for budget allocation: spend exactly the total budget)
//! 2. **Evaluate** - compute a scalar fitness, higher is better
//!
//! # Evaluators
//!
//! - [`budget::BudgetAllocationFitness`] - splits a total budget across campaigns,
//!   scored against historical ROI, conversion rate and click-through rate
//! - [`tuning::ParameterTuningFitness`] - scores campaign control parameters against
//!   a recency-weighted reading of recent performance
//!
//! # Scale
//!
//! Both evaluators produce fitness on a fixed, dimensionless scale (budget scores in
//! `[-1, 1]`, tuning scores in `[0, 1]`). The optimizer reports expected improvement
//! as a fitness difference, so a fixed scale keeps that figure comparable between
//! calls with different budgets or campaign counts.

use std::fmt;

use spendwise_core::{GeneKey, Genes, ParameterBounds};

pub mod budget;
pub mod tuning;

/// Scores candidate solutions for one optimization run.
///
/// Implementations capture the run's domain data (campaign history, objective,
/// bounds) at construction, so evaluation only needs the genes. Evaluation must be
/// pure: the optimizer evaluates chromosomes on several threads at once.
pub trait FitnessEvaluator: fmt::Debug + Send + Sync {
    /// Gene key type this evaluator understands.
    type Key: GeneKey;

    /// Computes fitness for a set of genes. Higher is better.
    fn evaluate(&self, genes: &Genes<Self::Key>) -> f64;

    /// Restores invariants that bounds alone do not express.
    ///
    /// Called after initialization, crossover and mutation, before evaluation.
    /// The default does nothing.
    fn repair(&self, _genes: &mut Genes<Self::Key>, _bounds: &ParameterBounds<Self::Key>) {}
}
