use std::collections::BTreeMap;

use rand::Rng;
use spendwise_core::{Genes, ParameterBounds, PerformanceObservation, TuningParam};
use spendwise_fitness::tuning::ParameterTuningFitness;
use tracing::{debug, warn};

use crate::{GeneticOptimizer, InvalidInputError, OptimizationResult, OptimizeError};

/// Objective label reported for parameter tuning runs.
const PARAMETER_TUNING: &str = "parameter_tuning";

impl<R> GeneticOptimizer<R>
where
    R: Rng,
{
    /// Tunes campaign control parameters against a recent performance history
    /// (oldest observation first).
    ///
    /// The known parameters present in `current_params` (`max_cpc`,
    /// `location_radius`, `daily_budget`) are evolved within their bounds: the
    /// registry entry for the name if any, the built-in default otherwise. Other
    /// entries are returned unchanged.
    ///
    /// Fitness comes from
    /// [`ParameterTuningFitness`](spendwise_fitness::tuning::ParameterTuningFitness), a
    /// heuristic proxy rather than a simulation of the ad platform.
    ///
    /// # Errors
    ///
    /// - [`InvalidInputError::EmptyParameters`] if no known parameter is supplied
    /// - [`OptimizeError::Configuration`] if the current configuration is invalid
    pub fn optimize_campaign_parameters(
        &mut self,
        current_params: &BTreeMap<String, f64>,
        performance_history: &[PerformanceObservation],
    ) -> Result<OptimizationResult, OptimizeError> {
        let mut template = Genes::new();
        let mut passthrough = BTreeMap::new();
        for (name, value) in current_params {
            match name.parse::<TuningParam>() {
                Ok(param) => {
                    template.insert(param, *value);
                }
                Err(_) => {
                    warn!(%name, "not a tunable parameter; returned unchanged");
                    passthrough.insert(name.clone(), *value);
                }
            }
        }
        if template.is_empty() {
            return Err(InvalidInputError::EmptyParameters.into());
        }
        self.config().validate()?;

        let bounds = template
            .keys()
            .map(|param: &TuningParam| {
                let bounds = self
                    .parameter_bounds()
                    .get(&param.to_string())
                    .copied()
                    .unwrap_or_else(|| param.default_bounds());
                (*param, bounds)
            })
            .collect::<ParameterBounds<_>>();
        let fitness = ParameterTuningFitness::new(performance_history, bounds.clone());
        debug!(
            signals = ?fitness.signals(),
            targets = ?fitness.target_values(),
            "tuning targets derived from performance history"
        );
        let evolution = self.evolve(&fitness, &template, bounds);
        Ok(evolution.into_result(PARAMETER_TUNING.to_owned(), self.config(), passthrough))
    }
}
