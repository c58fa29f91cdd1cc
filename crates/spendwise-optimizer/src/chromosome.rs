//! Candidate solutions and the populations they form.

use std::{num::NonZero, sync::Arc, thread};

use spendwise_core::{GeneKey, Genes, ParameterBounds};
use spendwise_fitness::FitnessEvaluator;
use spendwise_stats::descriptive::DescriptiveStats;

/// One candidate solution: named gene values plus their fitness.
///
/// The bounds are shared read-only between every chromosome of a run, so cloning
/// a chromosome copies its genes and fitness but not the bounds.
#[derive(Debug, Clone)]
pub struct Chromosome<K> {
    pub(crate) genes: Genes<K>,
    pub(crate) bounds: Arc<ParameterBounds<K>>,
    pub(crate) fitness: f64,
    pub(crate) evaluated: bool,
}

impl<K> Chromosome<K>
where
    K: GeneKey,
{
    /// Creates an unevaluated chromosome with fitness `0.0`.
    ///
    /// Genes are taken as given; call [`Chromosome::validate_genes`] to clip them.
    #[must_use]
    pub fn new(genes: Genes<K>, bounds: Arc<ParameterBounds<K>>) -> Self {
        Self {
            genes,
            bounds,
            fitness: 0.0,
            evaluated: false,
        }
    }

    #[must_use]
    pub fn genes(&self) -> &Genes<K> {
        &self.genes
    }

    #[must_use]
    pub fn bounds(&self) -> &ParameterBounds<K> {
        &self.bounds
    }

    /// Returns the fitness score. Meaningful only once [`Chromosome::is_evaluated`].
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Clips every gene that has a bound into `[min, max]`.
    ///
    /// Genes without a bound are left unchanged.
    pub fn validate_genes(&mut self) {
        for (key, value) in &mut self.genes {
            if let Some(bounds) = self.bounds.get(key) {
                *value = bounds.clamp(*value);
            }
        }
    }

    /// Scores the chromosome, replacing any previous fitness.
    ///
    /// Non-finite scores are stored as `f64::MIN` so that they never win a
    /// comparison.
    pub fn evaluate_with<E>(&mut self, evaluator: &E)
    where
        E: FitnessEvaluator<Key = K> + ?Sized,
    {
        let fitness = evaluator.evaluate(&self.genes);
        self.fitness = if fitness.is_finite() {
            fitness
        } else {
            f64::MIN
        };
        self.evaluated = true;
    }

    /// Applies the evaluator's repair step and marks the chromosome for re-evaluation.
    pub fn repair_with<E>(&mut self, evaluator: &E)
    where
        E: FitnessEvaluator<Key = K> + ?Sized,
    {
        evaluator.repair(&mut self.genes, &self.bounds);
        self.evaluated = false;
    }

    pub(crate) fn invalidate(&mut self) {
        self.evaluated = false;
    }

    #[must_use]
    pub fn into_genes(self) -> Genes<K> {
        self.genes
    }
}

/// Ordered collection of chromosomes evaluated together.
#[derive(Debug, Clone)]
pub struct Population<K> {
    chromosomes: Vec<Chromosome<K>>,
}

impl<K> From<Vec<Chromosome<K>>> for Population<K> {
    fn from(chromosomes: Vec<Chromosome<K>>) -> Self {
        Self { chromosomes }
    }
}

impl<K> Population<K>
where
    K: GeneKey,
{
    #[must_use]
    pub fn chromosomes(&self) -> &[Chromosome<K>] {
        &self.chromosomes
    }

    pub fn chromosomes_mut(&mut self) -> &mut [Chromosome<K>] {
        &mut self.chromosomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    #[must_use]
    pub fn into_chromosomes(self) -> Vec<Chromosome<K>> {
        self.chromosomes
    }

    /// Evaluates every chromosome not evaluated yet, in parallel.
    ///
    /// Work is split into one chunk per available core. Returns the number of
    /// chromosomes evaluated.
    pub fn evaluate<E>(&mut self, evaluator: &E) -> usize
    where
        E: FitnessEvaluator<Key = K> + ?Sized,
    {
        let mut pending = self
            .chromosomes
            .iter_mut()
            .filter(|c| !c.evaluated)
            .collect::<Vec<_>>();
        let count = pending.len();
        let threads = thread::available_parallelism().map_or(1, NonZero::get);
        if count <= 1 || threads == 1 {
            for chromosome in pending {
                chromosome.evaluate_with(evaluator);
            }
            return count;
        }

        let chunk_size = count.div_ceil(threads);
        thread::scope(|s| {
            for chunk in pending.chunks_mut(chunk_size) {
                s.spawn(move || {
                    for chromosome in chunk {
                        chromosome.evaluate_with(evaluator);
                    }
                });
            }
        });
        count
    }

    /// Returns the chromosome with the highest fitness (the first one on ties).
    #[must_use]
    pub fn best(&self) -> Option<&Chromosome<K>> {
        self.chromosomes
            .iter()
            .reduce(|best, c| if c.fitness > best.fitness { c } else { best })
    }

    /// Computes descriptive statistics over the fitness of evaluated chromosomes.
    #[must_use]
    pub fn fitness_stats(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(
            self.chromosomes
                .iter()
                .filter(|c| c.evaluated)
                .map(|c| c.fitness),
        )
    }
}

#[cfg(test)]
mod tests {
    use spendwise_core::{Bounds, TuningParam};

    use super::*;

    #[derive(Debug)]
    struct SumFitness;

    impl FitnessEvaluator for SumFitness {
        type Key = TuningParam;

        fn evaluate(&self, genes: &Genes<TuningParam>) -> f64 {
            genes.values().sum()
        }
    }

    fn bounds() -> Arc<ParameterBounds<TuningParam>> {
        Arc::new([(TuningParam::MaxCpc, Bounds::new(0.1, 5.0))].into())
    }

    #[test]
    fn test_validate_genes_clips_into_bounds() {
        let genes = [(TuningParam::MaxCpc, 9.0)].into();
        let mut chromosome = Chromosome::new(genes, bounds());
        chromosome.validate_genes();
        assert_eq!(chromosome.genes()[&TuningParam::MaxCpc], 5.0);

        chromosome.genes.insert(TuningParam::MaxCpc, -1.0);
        chromosome.validate_genes();
        assert_eq!(chromosome.genes()[&TuningParam::MaxCpc], 0.1);

        chromosome.genes.insert(TuningParam::MaxCpc, 2.5);
        chromosome.validate_genes();
        assert_eq!(chromosome.genes()[&TuningParam::MaxCpc], 2.5);
    }

    #[test]
    fn test_validate_genes_leaves_unbounded_genes() {
        let genes = [(TuningParam::MaxCpc, 1.0), (TuningParam::DailyBudget, 1e9)].into();
        let mut chromosome = Chromosome::new(genes, bounds());
        chromosome.validate_genes();
        assert_eq!(chromosome.genes()[&TuningParam::DailyBudget], 1e9);
    }

    #[test]
    fn test_clone_is_independent() {
        let genes = [(TuningParam::MaxCpc, 1.0)].into();
        let mut original = Chromosome::new(genes, bounds());
        original.evaluate_with(&SumFitness);
        let mut copy = original.clone();
        assert!(copy.is_evaluated());
        assert_eq!(copy.fitness(), 1.0);
        assert!(Arc::ptr_eq(&original.bounds, &copy.bounds));

        copy.genes.insert(TuningParam::MaxCpc, 3.0);
        copy.invalidate();
        assert_eq!(original.genes()[&TuningParam::MaxCpc], 1.0);
        assert!(original.is_evaluated());
        assert!(!copy.is_evaluated());
    }

    #[test]
    fn test_evaluate_is_refreshable() {
        let genes = [(TuningParam::MaxCpc, 1.0)].into();
        let mut chromosome = Chromosome::new(genes, bounds());
        chromosome.evaluate_with(&SumFitness);
        chromosome.genes.insert(TuningParam::MaxCpc, 2.0);
        chromosome.evaluate_with(&SumFitness);
        assert_eq!(chromosome.fitness(), 2.0);
    }

    #[test]
    fn test_population_evaluates_pending_only() {
        let bounds = bounds();
        let mut chromosomes = (0..8)
            .map(|i| Chromosome::new([(TuningParam::MaxCpc, f64::from(i))].into(), bounds.clone()))
            .collect::<Vec<_>>();
        chromosomes[0].fitness = 100.0;
        chromosomes[0].evaluated = true;
        let mut population = Population::from(chromosomes);

        assert_eq!(population.evaluate(&SumFitness), 7);
        assert!(population.chromosomes().iter().all(Chromosome::is_evaluated));
        assert_eq!(population.chromosomes()[0].fitness(), 100.0);
        assert_eq!(population.chromosomes()[7].fitness(), 7.0);
        assert_eq!(population.evaluate(&SumFitness), 0);

        let best = population.best().unwrap();
        assert_eq!(best.fitness(), 100.0);
        let stats = population.fitness_stats().unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.max, 100.0);
    }
}
