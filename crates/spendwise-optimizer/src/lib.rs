//! Genetic algorithm engine for marketing budget allocation and campaign tuning.
//!
//! This crate evolves candidate solutions ([`Chromosome`]s: named numeric genes plus a
//! fitness) to maximize a fitness function from `spendwise-fitness`. Two entry points
//! map domain inputs onto the same engine:
//!
//! - [`GeneticOptimizer::optimize_budget_allocation`] - split a total budget across
//!   campaigns given their historical ROI, conversion rate and click-through rate
//! - [`GeneticOptimizer::optimize_campaign_parameters`] - tune `max_cpc`,
//!   `location_radius` and `daily_budget` from a recent performance history
//!
//! # Algorithm Overview
//!
//! 1. **Template** - the starting point (even split, or the current parameters) and
//!    the bounds of every gene
//! 2. **Initialize** - sample `population_size` chromosomes uniformly within bounds;
//!    the template itself takes the first slot
//! 3. **Evaluate** - score every chromosome not scored yet (in parallel)
//! 4. **Track** - keep a snapshot of the best chromosome seen so far and its history
//! 5. **Terminate?** - stop on stagnation, convergence, cancellation or after
//!    `max_generations`
//! 6. **Breed** - carry over the elite, fill the rest by tournament selection,
//!    crossover, mutation and repair, then go to 3
//!
//! # Termination
//!
//! Checked after each generation, first match wins:
//!
//! 1. **Stagnated** - the best fitness has not strictly improved for
//!    `max_stagnant_generations` generations
//! 2. **Converged** - the best fitness of the latest generation differs from the
//!    previous generation's by less than `convergence_threshold` (a flat plateau
//!    counts); a threshold of `0` disables this rule
//! 3. **Cancelled** - the flag installed by [`GeneticOptimizer::set_cancel_flag`] is set
//! 4. **Max generations** - the loop ran out
//!
//! # Reproducibility
//!
//! Every stochastic step draws from the optimizer's own generator. Fitness evaluation
//! is pure and consumes no randomness, so it can run on several threads without
//! affecting a seeded run.
//!
//! # Errors
//!
//! Input errors ([`InvalidInputError`]) and configuration errors ([`ConfigError`]) are
//! reported before any population work. Degenerate but valid inputs, such as a zero
//! budget or a bound whose minimum equals its maximum, produce a well-formed result.

pub use self::{chromosome::*, config::*, optimizer::*, result::*};

mod budget;
mod chromosome;
mod config;
pub mod operators;
mod optimizer;
mod result;
mod tuning;

/// Rejected optimization input.
#[derive(
    Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::IsVariant,
)]
pub enum InvalidInputError {
    #[display("campaign list is empty")]
    EmptyCampaigns,
    #[display("no tunable parameters supplied")]
    EmptyParameters,
    #[display("total budget must be finite and non-negative, got {total_budget}")]
    InvalidTotalBudget { total_budget: f64 },
    #[display("bounds of {name} must be finite, got [{min}, {max}]")]
    NonFiniteBounds { name: String, min: f64, max: f64 },
    /// Campaign bounds cannot add up to the total budget.
    #[display(
        "campaign bounds admit totals in [{min_total}, {max_total}], which excludes the budget {total_budget}"
    )]
    InfeasibleBounds {
        total_budget: f64,
        min_total: f64,
        max_total: f64,
    },
}

/// Error returned by the optimization entry points.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum OptimizeError {
    #[display("invalid input: {_0}")]
    InvalidInput(InvalidInputError),
    #[display("invalid configuration: {_0}")]
    Configuration(ConfigError),
}
