//! The evolutionary engine.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;
use serde::Serialize;
use spendwise_core::{Bounds, GeneKey, Genes, ParameterBounds};
use spendwise_fitness::FitnessEvaluator;
use tracing::{debug, info};

use crate::{
    Chromosome, ConfigError, ConvergenceReason, CrossoverStrategy, FitnessSummary, GeneticConfig,
    InvalidInputError, OptimizationMethod, OptimizationResult, Population, RunMetadata,
    confidence_score, operators,
};

/// Snapshot of an optimizer's settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizerStatus {
    /// Whether [`GeneticOptimizer::configure`] has accepted a configuration.
    pub configured: bool,
    pub config: GeneticConfig,
    pub parameter_bounds_count: usize,
    pub constraints_count: usize,
}

/// Genetic algorithm optimizer for budget allocation and campaign parameter tuning.
///
/// One instance owns its configuration, its bounds registry and its random source.
/// Runs on separate instances share nothing and may execute concurrently.
///
/// The random source is injected at construction: [`GeneticOptimizer::new`] seeds a
/// fresh generator, [`GeneticOptimizer::with_seed`] makes runs reproducible, and
/// [`GeneticOptimizer::with_rng`] accepts any [`Rng`].
///
/// # Example
///
/// ```
/// use spendwise_core::{CampaignStats, Objective};
/// use spendwise_optimizer::{GeneticConfig, GeneticOptimizer};
///
/// let config = GeneticConfig {
///     population_size: 10,
///     max_generations: 5,
///     ..GeneticConfig::default()
/// };
/// let mut optimizer = GeneticOptimizer::with_seed(config, 42);
/// let campaigns = [
///     CampaignStats { roi: 2.5, conversion_rate: 0.03, ctr: 0.01 },
///     CampaignStats { roi: 1.8, conversion_rate: 0.02, ctr: 0.008 },
/// ];
/// let result = optimizer
///     .optimize_budget_allocation(&campaigns, 2000.0, Objective::MaximizeRoi)
///     .unwrap();
/// let spent: f64 = result.optimized_parameters.values().sum();
/// assert!((spent - 2000.0).abs() < 1.0);
/// assert!(result.iterations_used <= 5);
/// ```
#[derive(Debug)]
pub struct GeneticOptimizer<R = Pcg64> {
    config: GeneticConfig,
    configured: bool,
    rng: R,
    parameter_bounds: BTreeMap<String, Bounds>,
    constraints: BTreeMap<String, Bounds>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl GeneticOptimizer<Pcg64> {
    /// Creates an optimizer with a freshly seeded random source.
    #[must_use]
    pub fn new(config: GeneticConfig) -> Self {
        Self::with_rng(config, Pcg64::from_rng(&mut rand::rng()))
    }

    /// Creates an optimizer whose runs are reproducible for a given seed.
    #[must_use]
    pub fn with_seed(config: GeneticConfig, seed: u64) -> Self {
        Self::with_rng(config, Pcg64::seed_from_u64(seed))
    }
}

impl Default for GeneticOptimizer<Pcg64> {
    fn default() -> Self {
        Self::new(GeneticConfig::default())
    }
}

impl<R> GeneticOptimizer<R>
where
    R: Rng,
{
    pub fn with_rng(config: GeneticConfig, rng: R) -> Self {
        Self {
            config,
            configured: false,
            rng,
            parameter_bounds: BTreeMap::new(),
            constraints: BTreeMap::new(),
            cancel_flag: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Replaces the configuration after validating it.
    ///
    /// On error the previous configuration stays in effect.
    pub fn configure(&mut self, config: GeneticConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.configured = true;
        Ok(())
    }

    /// Merges explicit bounds into the registry, replacing entries with the same name.
    ///
    /// Nothing is merged if any entry has a non-finite endpoint.
    pub fn set_parameter_bounds<I, S, B>(&mut self, bounds: I) -> Result<(), InvalidInputError>
    where
        I: IntoIterator<Item = (S, B)>,
        S: Into<String>,
        B: Into<Bounds>,
    {
        let entries = finite_entries(bounds)?;
        self.parameter_bounds.extend(entries);
        Ok(())
    }

    /// Merges `{name -> {min, max}}` constraints; each one also becomes the bound of
    /// that parameter.
    ///
    /// Nothing is merged if any entry has a non-finite endpoint.
    pub fn set_constraints<I, S>(&mut self, constraints: I) -> Result<(), InvalidInputError>
    where
        I: IntoIterator<Item = (S, Bounds)>,
        S: Into<String>,
    {
        for (name, constraint) in finite_entries(constraints)? {
            self.parameter_bounds.insert(name.clone(), constraint);
            self.constraints.insert(name, constraint);
        }
        Ok(())
    }

    #[must_use]
    pub fn parameter_bounds(&self) -> &BTreeMap<String, Bounds> {
        &self.parameter_bounds
    }

    #[must_use]
    pub fn constraints(&self) -> &BTreeMap<String, Bounds> {
        &self.constraints
    }

    /// Installs a flag that stops the run at the next generation boundary once set.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel_flag = Some(flag);
    }

    #[must_use]
    pub fn status(&self) -> OptimizerStatus {
        OptimizerStatus {
            configured: self.configured,
            config: self.config.clone(),
            parameter_bounds_count: self.parameter_bounds.len(),
            constraints_count: self.constraints.len(),
        }
    }

    /// Samples `population_size` chromosomes from a template.
    ///
    /// See [`operators::random_chromosome`].
    pub fn initialize_population<K>(
        &mut self,
        template: &Genes<K>,
        bounds: &Arc<ParameterBounds<K>>,
    ) -> Population<K>
    where
        K: GeneKey,
    {
        (0..self.config.population_size)
            .map(|_| operators::random_chromosome(template, bounds, &mut self.rng))
            .collect::<Vec<_>>()
            .into()
    }

    /// Scores one chromosome, replacing any previous fitness.
    pub fn evaluate_fitness<E>(&self, chromosome: &mut Chromosome<E::Key>, evaluator: &E)
    where
        E: FitnessEvaluator,
    {
        chromosome.evaluate_with(evaluator);
    }

    /// See [`operators::tournament_select`].
    pub fn tournament_selection<'a, K>(
        &mut self,
        population: &'a [Chromosome<K>],
    ) -> Option<&'a Chromosome<K>> {
        operators::tournament_select(
            population,
            self.config.tournament_size,
            self.config.tournament_sampling,
            &mut self.rng,
        )
    }

    /// See [`operators::single_point_crossover`].
    pub fn single_point_crossover<K>(
        &mut self,
        parent1: &Chromosome<K>,
        parent2: &Chromosome<K>,
    ) -> (Chromosome<K>, Chromosome<K>)
    where
        K: GeneKey,
    {
        operators::single_point_crossover(
            parent1,
            parent2,
            self.config.crossover_rate,
            &mut self.rng,
        )
    }

    /// See [`operators::two_point_crossover`].
    pub fn two_point_crossover<K>(
        &mut self,
        parent1: &Chromosome<K>,
        parent2: &Chromosome<K>,
    ) -> (Chromosome<K>, Chromosome<K>)
    where
        K: GeneKey,
    {
        operators::two_point_crossover(parent1, parent2, self.config.crossover_rate, &mut self.rng)
    }

    /// Applies the configured [`CrossoverStrategy`].
    fn crossover<K>(
        &mut self,
        parent1: &Chromosome<K>,
        parent2: &Chromosome<K>,
        generation: usize,
    ) -> (Chromosome<K>, Chromosome<K>)
    where
        K: GeneKey,
    {
        match self.config.crossover {
            CrossoverStrategy::SinglePoint => self.single_point_crossover(parent1, parent2),
            CrossoverStrategy::TwoPoint => self.two_point_crossover(parent1, parent2),
            CrossoverStrategy::Alternating if generation % 2 == 0 => {
                self.single_point_crossover(parent1, parent2)
            }
            CrossoverStrategy::Alternating => self.two_point_crossover(parent1, parent2),
        }
    }

    /// See [`operators::mutate`].
    pub fn mutate<K>(&mut self, chromosome: &Chromosome<K>) -> Chromosome<K>
    where
        K: GeneKey,
    {
        operators::mutate(chromosome, self.config.mutation_rate, &mut self.rng)
    }

    /// Returns the `max(1, round(population_size × elitism_rate))` fittest
    /// chromosomes, best first, without reordering `population`.
    #[must_use]
    pub fn get_elite<K>(&self, population: &[Chromosome<K>]) -> Vec<Chromosome<K>>
    where
        K: GeneKey,
    {
        operators::select_elite(population, self.config.elite_count())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Runs the generation loop from a template.
    ///
    /// 1. The template, repaired and scored, is the baseline; it also replaces the
    ///    first sampled chromosome so the run never ends below it
    /// 2. Each generation evaluates pending chromosomes, tracks the best one, then
    ///    checks termination in order: stagnation, convergence (successive
    ///    best-fitness values closer than `convergence_threshold`), cancellation
    /// 3. Otherwise the elite plus bred offspring form the next population
    ///
    /// The configuration must already be validated.
    pub(crate) fn evolve<E>(
        &mut self,
        evaluator: &E,
        template: &Genes<E::Key>,
        bounds: ParameterBounds<E::Key>,
    ) -> Evolution<E::Key>
    where
        E: FitnessEvaluator,
    {
        let bounds = Arc::new(bounds);
        let mut baseline = Chromosome::new(template.clone(), Arc::clone(&bounds));
        baseline.validate_genes();
        baseline.repair_with(evaluator);
        baseline.evaluate_with(evaluator);

        let mut population = self.initialize_population(template, &bounds);
        for chromosome in population.chromosomes_mut() {
            chromosome.repair_with(evaluator);
        }
        if let Some(first) = population.chromosomes_mut().first_mut() {
            *first = baseline.clone();
        }

        let max_generations = self.config.max_generations;
        let mut best = baseline.clone();
        let mut stagnant_generations = 0;
        let mut fitness_history = Vec::with_capacity(max_generations);
        let mut reason = ConvergenceReason::MaxGenerations;

        for generation in 0..max_generations {
            population.evaluate(evaluator);
            let Some(generation_best) = population.best() else {
                break;
            };
            let generation_best_fitness = generation_best.fitness();
            let improvement = generation_best_fitness - best.fitness();
            if improvement > 0.0 {
                best = generation_best.clone();
                stagnant_generations = 0;
            } else {
                stagnant_generations += 1;
            }
            fitness_history.push(generation_best_fitness);
            debug!(
                generation,
                best_fitness = generation_best_fitness,
                stagnant_generations,
                "generation evaluated"
            );

            if stagnant_generations >= self.config.max_stagnant_generations {
                reason = ConvergenceReason::Stagnated;
                break;
            }
            if let &[.., previous, latest] = fitness_history.as_slice()
                && (latest - previous).abs() < self.config.convergence_threshold
            {
                reason = ConvergenceReason::Converged;
                break;
            }
            if self.is_cancelled() {
                reason = ConvergenceReason::Cancelled;
                break;
            }
            if generation + 1 < max_generations {
                population = self.next_generation(&population, evaluator, generation);
            }
        }

        Evolution {
            iterations_used: fitness_history.len(),
            best,
            baseline_fitness: baseline.fitness(),
            fitness_history,
            reason,
            population,
        }
    }

    /// Elite carried over unchanged, the rest bred by tournament selection,
    /// crossover, mutation and repair.
    fn next_generation<E>(
        &mut self,
        population: &Population<E::Key>,
        evaluator: &E,
        generation: usize,
    ) -> Population<E::Key>
    where
        E: FitnessEvaluator,
    {
        let size = self.config.population_size;
        let parents = population.chromosomes();
        let mut next = self.get_elite(parents);
        next.truncate(size);

        while next.len() < size {
            let (Some(parent1), Some(parent2)) = (
                self.tournament_selection(parents),
                self.tournament_selection(parents),
            ) else {
                break;
            };
            let (child1, child2) = self.crossover(parent1, parent2, generation);
            for child in [child1, child2] {
                let mut child = self.mutate(&child);
                child.repair_with(evaluator);
                next.push(child);
            }
        }
        next.truncate(size);
        next.into()
    }
}

fn finite_entries<I, S, B>(entries: I) -> Result<Vec<(String, Bounds)>, InvalidInputError>
where
    I: IntoIterator<Item = (S, B)>,
    S: Into<String>,
    B: Into<Bounds>,
{
    entries
        .into_iter()
        .map(|(name, bounds)| {
            let (name, bounds) = (name.into(), bounds.into());
            if bounds.is_finite() {
                Ok((name, bounds))
            } else {
                Err(InvalidInputError::NonFiniteBounds {
                    name,
                    min: bounds.min,
                    max: bounds.max,
                })
            }
        })
        .collect()
}

/// Outcome of the generation loop, before it is mapped to domain parameters.
#[derive(Debug)]
pub(crate) struct Evolution<K> {
    pub(crate) best: Chromosome<K>,
    pub(crate) baseline_fitness: f64,
    pub(crate) fitness_history: Vec<f64>,
    pub(crate) iterations_used: usize,
    pub(crate) reason: ConvergenceReason,
    pub(crate) population: Population<K>,
}

impl<K> Evolution<K>
where
    K: GeneKey,
{
    pub(crate) fn into_result(
        self,
        objective: String,
        config: &GeneticConfig,
        passthrough_parameters: BTreeMap<String, f64>,
    ) -> OptimizationResult {
        let best_fitness = self.best.fitness();
        let improvement = best_fitness - self.baseline_fitness;
        let expected_improvement = if improvement.is_finite() {
            improvement.max(0.0)
        } else {
            0.0
        };
        let final_population = self
            .population
            .fitness_stats()
            .as_ref()
            .map(FitnessSummary::from);
        let confidence_score = confidence_score(
            &self.fitness_history,
            self.population
                .chromosomes()
                .iter()
                .filter(|c| c.is_evaluated())
                .map(Chromosome::fitness),
        );
        info!(
            %objective,
            reason = %self.reason,
            iterations = self.iterations_used,
            best_fitness,
            expected_improvement,
            confidence_score,
            "optimization finished"
        );

        let mut optimized_parameters = self
            .best
            .into_genes()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<BTreeMap<_, _>>();
        optimized_parameters.extend(
            passthrough_parameters
                .iter()
                .map(|(name, value)| (name.clone(), *value)),
        );

        OptimizationResult {
            optimization_method: OptimizationMethod::GeneticAlgorithm,
            optimized_parameters,
            expected_improvement,
            confidence_score,
            iterations_used: self.iterations_used,
            metadata: RunMetadata {
                objective,
                convergence_reason: self.reason,
                best_fitness,
                baseline_fitness: self.baseline_fitness,
                fitness_history: self.fitness_history,
                population_size: config.population_size,
                max_generations: config.max_generations,
                crossover: config.crossover,
                final_population,
                passthrough_parameters,
            },
        }
    }
}
