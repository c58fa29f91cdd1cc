//! Genetic operators over [`Chromosome`]s.
//!
//! These are the building blocks [`GeneticOptimizer`](crate::GeneticOptimizer)
//! drives each generation. They take the random source explicitly, so a seeded
//! generator reproduces a run exactly.
//!
//! # Operations
//!
//! - **Initialization**: [`random_chromosome`] samples each bounded gene uniformly
//! - **Selection**: [`tournament_select`] keeps the fittest of a small random sample
//! - **Crossover**: [`single_point_crossover`] and [`two_point_crossover`] exchange
//!   contiguous runs of genes (in key order) between two parents
//! - **Mutation**: [`mutate`] redraws genes from their bound interval
//! - **Elitism**: [`select_elite`] picks the top chromosomes by fitness
//!
//! # Design Decisions
//!
//! ## Segment-exchange crossover
//!
//! Crossover only moves values between parents and never blends them, so every
//! offspring gene value was present in one of the parents. Exploration of new values
//! is left entirely to mutation.
//!
//! ## Redraw mutation
//!
//! A mutated bounded gene is replaced by a fresh uniform draw from its interval
//! rather than nudged, which keeps the search from collapsing around the initial
//! samples. Genes without a bound get a Gaussian perturbation scaled to their
//! magnitude and truncated at three standard deviations.

use std::{mem, ops::Range, sync::Arc};

use rand::{Rng, seq::IndexedRandom};
use rand_distr::Normal;
use spendwise_core::{GeneKey, Genes, ParameterBounds};

use crate::{Chromosome, TournamentSampling};

/// Relative standard deviation of the perturbation applied to unbounded genes.
const UNBOUNDED_MUTATION_SCALE: f64 = 0.1;

/// Creates a chromosome from a template.
///
/// Each template gene with a bound is sampled uniformly within it; genes without a
/// bound keep their template value. The result is validated against the bounds.
pub fn random_chromosome<K, R>(
    template: &Genes<K>,
    bounds: &Arc<ParameterBounds<K>>,
    rng: &mut R,
) -> Chromosome<K>
where
    K: GeneKey,
    R: Rng + ?Sized,
{
    let genes = template
        .iter()
        .map(|(key, value)| {
            let value = bounds.get(key).map_or(*value, |b| b.sample(rng));
            (key.clone(), value)
        })
        .collect();
    let mut chromosome = Chromosome::new(genes, Arc::clone(bounds));
    chromosome.validate_genes();
    chromosome
}

/// Selects a parent by tournament.
///
/// Draws `tournament_size` contestants and returns the fittest. Without replacement
/// the sample is clamped to the population size. Returns `None` only for an empty
/// population.
pub fn tournament_select<'a, K, R>(
    population: &'a [Chromosome<K>],
    tournament_size: usize,
    sampling: TournamentSampling,
    rng: &mut R,
) -> Option<&'a Chromosome<K>>
where
    R: Rng + ?Sized,
{
    let size = tournament_size.max(1);
    let fittest = |best: &'a Chromosome<K>, c: &'a Chromosome<K>| {
        if c.fitness > best.fitness { c } else { best }
    };
    match sampling {
        TournamentSampling::WithoutReplacement => population
            .choose_multiple(rng, size.min(population.len()))
            .reduce(fittest),
        TournamentSampling::WithReplacement => (0..size)
            .filter_map(|_| population.choose(rng))
            .reduce(fittest),
    }
}

/// Single-point crossover.
///
/// With probability `crossover_rate`, cuts the ordered genes at one random position
/// and swaps the tails. Otherwise, or with fewer than two genes, returns unmodified
/// copies of the parents.
pub fn single_point_crossover<K, R>(
    parent1: &Chromosome<K>,
    parent2: &Chromosome<K>,
    crossover_rate: f64,
    rng: &mut R,
) -> (Chromosome<K>, Chromosome<K>)
where
    K: GeneKey,
    R: Rng + ?Sized,
{
    let len = parent1.genes.len();
    if len < 2 || rng.random::<f64>() >= crossover_rate {
        return (parent1.clone(), parent2.clone());
    }
    let point = rng.random_range(1..len);
    exchange_segment(parent1, parent2, point..len)
}

/// Two-point crossover.
///
/// With probability `crossover_rate`, cuts the ordered genes at two random positions
/// and swaps the middle segment. With fewer than three genes there is no middle
/// segment, so this degrades to [`single_point_crossover`].
pub fn two_point_crossover<K, R>(
    parent1: &Chromosome<K>,
    parent2: &Chromosome<K>,
    crossover_rate: f64,
    rng: &mut R,
) -> (Chromosome<K>, Chromosome<K>)
where
    K: GeneKey,
    R: Rng + ?Sized,
{
    let len = parent1.genes.len();
    if len < 3 {
        return single_point_crossover(parent1, parent2, crossover_rate, rng);
    }
    if rng.random::<f64>() >= crossover_rate {
        return (parent1.clone(), parent2.clone());
    }
    let start = rng.random_range(1..len - 1);
    let end = rng.random_range(start + 1..len);
    exchange_segment(parent1, parent2, start..end)
}

fn exchange_segment<K>(
    parent1: &Chromosome<K>,
    parent2: &Chromosome<K>,
    segment: Range<usize>,
) -> (Chromosome<K>, Chromosome<K>)
where
    K: GeneKey,
{
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    for key in parent1.genes.keys().skip(segment.start).take(segment.len()) {
        if let (Some(a), Some(b)) = (child1.genes.get_mut(key), child2.genes.get_mut(key)) {
            mem::swap(a, b);
        }
    }
    for child in [&mut child1, &mut child2] {
        child.validate_genes();
        child.invalidate();
    }
    (child1, child2)
}

/// Returns a mutated copy of `chromosome`; the input is left untouched.
///
/// Each gene is, with probability `mutation_rate`, replaced by a uniform draw from
/// its bound interval, or perturbed by truncated Gaussian noise if unbounded. The
/// copy is always marked for re-evaluation.
pub fn mutate<K, R>(chromosome: &Chromosome<K>, mutation_rate: f64, rng: &mut R) -> Chromosome<K>
where
    K: GeneKey,
    R: Rng + ?Sized,
{
    let mut mutated = chromosome.clone();
    for (key, value) in &mut mutated.genes {
        if rng.random::<f64>() >= mutation_rate {
            continue;
        }
        *value = match mutated.bounds.get(key) {
            Some(bounds) => bounds.sample(rng),
            None => perturb(*value, rng),
        };
    }
    mutated.invalidate();
    mutated
}

fn perturb<R>(value: f64, rng: &mut R) -> f64
where
    R: Rng + ?Sized,
{
    let sigma = UNBOUNDED_MUTATION_SCALE * value.abs().max(1.0);
    match Normal::new(0.0, sigma) {
        Ok(normal) => value + rng.sample(normal).clamp(-3.0 * sigma, 3.0 * sigma),
        Err(_) => value,
    }
}

/// Returns clones of the `count` fittest chromosomes, best first.
///
/// The input order is not changed. Ties keep their population order.
#[must_use]
pub fn select_elite<K>(population: &[Chromosome<K>], count: usize) -> Vec<Chromosome<K>>
where
    K: GeneKey,
{
    let mut ranked = population.iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    ranked.into_iter().take(count).cloned().collect()
}
