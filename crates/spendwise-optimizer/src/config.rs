//! Genetic algorithm parameters.

use serde::{Deserialize, Serialize};

/// How two parents exchange genes.
///
/// Cut points index into the parents' genes in key order.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverStrategy {
    /// One cut point, tails exchanged.
    #[display("single_point")]
    SinglePoint,
    /// Two cut points, middle segments exchanged. Falls back to a single cut when
    /// there are fewer than three genes.
    #[default]
    #[display("two_point")]
    TwoPoint,
    /// Single-point on even generations, two-point on odd ones.
    #[display("alternating")]
    Alternating,
}

/// How tournament contestants are drawn from the population.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TournamentSampling {
    /// Distinct contestants; the sample is clamped to the population size.
    #[default]
    #[display("without_replacement")]
    WithoutReplacement,
    /// Contestants drawn independently; the same individual may appear twice.
    #[display("with_replacement")]
    WithReplacement,
}

/// Parameters of one optimizer instance.
///
/// Deserializes from partial JSON: missing fields take their defaults.
///
/// ```
/// use spendwise_optimizer::GeneticConfig;
///
/// let config = GeneticConfig::default();
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.elite_count(), 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Number of chromosomes per generation
    pub population_size: usize,
    /// Upper bound on generations evaluated
    pub max_generations: usize,
    /// Probability that a selected pair exchanges genes
    pub crossover_rate: f64,
    /// Per-gene probability of being redrawn
    pub mutation_rate: f64,
    /// Contestants per tournament (larger = stronger selection pressure)
    pub tournament_size: usize,
    /// Share of the population carried over unchanged
    pub elitism_rate: f64,
    /// Generation-to-generation changes of the best fitness smaller than this
    /// count as converged (`0` disables the rule)
    pub convergence_threshold: f64,
    /// Generations without improvement before the run stops
    pub max_stagnant_generations: usize,
    pub crossover: CrossoverStrategy,
    pub tournament_sampling: TournamentSampling,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            tournament_size: 3,
            elitism_rate: 0.1,
            convergence_threshold: 1e-6,
            max_stagnant_generations: 20,
            crossover: CrossoverStrategy::default(),
            tournament_sampling: TournamentSampling::default(),
        }
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population_size must be at least 1")]
    EmptyPopulation,
    #[display("max_generations must be at least 1")]
    NoGenerations,
    #[display("max_stagnant_generations must be at least 1")]
    NoStagnationAllowance,
    #[display("{name} must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[display(
        "tournament_size must be in 1..={population_size} (population_size), got {tournament_size}"
    )]
    TournamentSize {
        tournament_size: usize,
        population_size: usize,
    },
    #[display("convergence_threshold must be finite and non-negative, got {value}")]
    InvalidConvergenceThreshold { value: f64 },
}

impl GeneticConfig {
    /// Checks every parameter against its admissible range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.max_stagnant_generations == 0 {
            return Err(ConfigError::NoStagnationAllowance);
        }
        for (name, value) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
            ("elitism_rate", self.elitism_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if !(1..=self.population_size).contains(&self.tournament_size) {
            return Err(ConfigError::TournamentSize {
                tournament_size: self.tournament_size,
                population_size: self.population_size,
            });
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(ConfigError::InvalidConvergenceThreshold {
                value: self.convergence_threshold,
            });
        }
        Ok(())
    }

    /// Number of chromosomes carried over unchanged:
    /// `max(1, round(population_size × elitism_rate))`, capped at the population size.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn elite_count(&self) -> usize {
        let count = (self.population_size as f64 * self.elitism_rate.clamp(0.0, 1.0)).round();
        (count as usize).clamp(1, self.population_size.max(1))
    }
}
