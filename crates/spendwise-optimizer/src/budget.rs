use rand::Rng;
use spendwise_core::{CampaignSlot, CampaignStats, Objective};
use spendwise_fitness::budget::BudgetAllocationFitness;
use tracing::warn;

use crate::{GeneticOptimizer, InvalidInputError, OptimizationResult, OptimizeError};

/// Slack, relative to the budget, when checking that campaign bounds can spend it.
const FEASIBILITY_TOLERANCE: f64 = 1e-9;

impl<R> GeneticOptimizer<R>
where
    R: Rng,
{
    /// Splits `total_budget` across `campaigns` to maximize `objective`.
    ///
    /// Genes are `campaign_{i}_budget`, starting from an even split, each bounded to
    /// `[0, total_budget]`. Registry bounds naming a campaign narrow its range. Every
    /// candidate is renormalized to spend exactly the total budget, so the returned
    /// allocation sums to `total_budget`.
    ///
    /// # Errors
    ///
    /// - [`InvalidInputError::EmptyCampaigns`] if `campaigns` is empty
    /// - [`InvalidInputError::InvalidTotalBudget`] if the budget is negative or not finite
    /// - [`InvalidInputError::InfeasibleBounds`] if the narrowed campaign bounds cannot
    ///   sum to `total_budget`
    /// - [`OptimizeError::Configuration`] if the current configuration is invalid
    pub fn optimize_budget_allocation(
        &mut self,
        campaigns: &[CampaignStats],
        total_budget: f64,
        objective: Objective,
    ) -> Result<OptimizationResult, OptimizeError> {
        if campaigns.is_empty() {
            return Err(InvalidInputError::EmptyCampaigns.into());
        }
        if !total_budget.is_finite() || total_budget < 0.0 {
            return Err(InvalidInputError::InvalidTotalBudget { total_budget }.into());
        }
        self.config().validate()?;

        let fitness = BudgetAllocationFitness::new(campaigns.to_vec(), total_budget, objective);
        let mut bounds = fitness.default_bounds();
        for (name, registered) in self.parameter_bounds() {
            let Ok(slot) = name.parse::<CampaignSlot>() else {
                continue;
            };
            let Some(entry) = bounds.get_mut(&slot) else {
                warn!(%name, "bound names a campaign that is not part of this allocation");
                continue;
            };
            match entry.intersect(registered) {
                Some(narrowed) => *entry = narrowed,
                None => warn!(%name, "bound lies outside [0, total_budget]; ignored"),
            }
        }

        let min_total = bounds.values().map(|b| b.min).sum::<f64>();
        let max_total = bounds.values().map(|b| b.max).sum::<f64>();
        let tolerance = FEASIBILITY_TOLERANCE * total_budget.max(1.0);
        if total_budget < min_total - tolerance || total_budget > max_total + tolerance {
            return Err(InvalidInputError::InfeasibleBounds {
                total_budget,
                min_total,
                max_total,
            }
            .into());
        }

        let template = fitness.even_split();
        let evolution = self.evolve(&fitness, &template, bounds);
        Ok(evolution.into_result(objective.to_string(), self.config(), Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use spendwise_core::Bounds;

    use crate::{ConfigError, ConvergenceReason, GeneticConfig, OptimizationMethod};

    use super::*;

    fn two_campaigns() -> Vec<CampaignStats> {
        vec![
            CampaignStats {
                roi: 2.5,
                conversion_rate: 0.03,
                ctr: 0.01,
            },
            CampaignStats {
                roi: 1.8,
                conversion_rate: 0.02,
                ctr: 0.008,
            },
        ]
    }

    fn small_config() -> GeneticConfig {
        GeneticConfig {
            population_size: 10,
            max_generations: 5,
            ..GeneticConfig::default()
        }
    }

    fn spent(result: &OptimizationResult) -> f64 {
        result.optimized_parameters.values().sum()
    }

    #[test]
    fn test_two_campaign_scenario() {
        let mut optimizer = GeneticOptimizer::with_seed(small_config(), 1);
        let result = optimizer
            .optimize_budget_allocation(&two_campaigns(), 2000.0, Objective::MaximizeRoi)
            .unwrap();
        assert_eq!(
            result.optimization_method,
            OptimizationMethod::GeneticAlgorithm
        );
        assert_eq!(result.optimization_method.to_string(), "genetic_algorithm");
        assert!((spent(&result) - 2000.0).abs() < 1.0);
        assert!(result.expected_improvement >= 0.0);
        assert!(result.iterations_used <= 5);
        assert!((0.0..=1.0).contains(&result.confidence_score));
        assert_eq!(result.metadata.objective, "maximize_roi");
        assert_eq!(
            result.metadata.fitness_history.len(),
            result.iterations_used
        );
        assert!(result.optimized_parameters.contains_key("campaign_0_budget"));
        assert!(result.optimized_parameters.contains_key("campaign_1_budget"));
    }

    #[test]
    fn test_roi_shifts_budget_toward_best_campaign() {
        let config = GeneticConfig {
            population_size: 30,
            max_generations: 60,
            ..GeneticConfig::default()
        };
        let mut optimizer = GeneticOptimizer::with_seed(config, 2);
        let result = optimizer
            .optimize_budget_allocation(&two_campaigns(), 2000.0, Objective::MaximizeRoi)
            .unwrap();
        assert!(result.optimized_parameters["campaign_0_budget"] > 1000.0);
        assert!(result.expected_improvement > 0.0);
    }

    #[test]
    fn test_budget_sum_holds_for_every_objective() {
        let campaigns = vec![
            CampaignStats {
                roi: 1.2,
                conversion_rate: 0.05,
                ctr: 0.002,
            },
            CampaignStats {
                roi: 3.1,
                conversion_rate: 0.01,
                ctr: 0.02,
            },
            CampaignStats {
                roi: 0.4,
                conversion_rate: 0.02,
                ctr: 0.03,
            },
            CampaignStats {
                roi: 2.0,
                conversion_rate: 0.04,
                ctr: 0.01,
            },
        ];
        for (seed, objective) in (0..).zip(Objective::ALL) {
            for total_budget in [1.0, 750.0, 123_456.0] {
                let mut optimizer = GeneticOptimizer::with_seed(small_config(), seed);
                let result = optimizer
                    .optimize_budget_allocation(&campaigns, total_budget, objective)
                    .unwrap();
                assert!(
                    (spent(&result) - total_budget).abs() < 1.0,
                    "{objective} / {total_budget}: {:?}",
                    result.optimized_parameters
                );
                assert!(result.optimized_parameters.values().all(|v| *v >= 0.0));
            }
        }
    }

    #[test]
    fn test_single_campaign_gets_whole_budget() {
        for total_budget in [0.0, 1.0, 999.99, 50_000.0] {
            let mut optimizer = GeneticOptimizer::with_seed(small_config(), 3);
            let result = optimizer
                .optimize_budget_allocation(&two_campaigns()[..1], total_budget, Objective::Combined)
                .unwrap();
            assert_eq!(
                result.optimized_parameters,
                BTreeMap::from([("campaign_0_budget".to_owned(), total_budget)])
            );
        }
    }

    #[test]
    fn test_empty_campaigns_rejected_for_any_budget() {
        for total_budget in [0.0, 1.0, -5.0, f64::NAN, 1e9] {
            let mut optimizer = GeneticOptimizer::with_seed(small_config(), 4);
            let err = optimizer
                .optimize_budget_allocation(&[], total_budget, Objective::MaximizeRoi)
                .unwrap_err();
            assert_eq!(
                err,
                OptimizeError::InvalidInput(InvalidInputError::EmptyCampaigns)
            );
        }
    }

    #[test]
    fn test_negative_budget_rejected() {
        let mut optimizer = GeneticOptimizer::with_seed(small_config(), 5);
        let err = optimizer
            .optimize_budget_allocation(&two_campaigns(), -1.0, Objective::MaximizeRoi)
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::InvalidInput(InvalidInputError::InvalidTotalBudget { .. })
        ));
    }

    #[test]
    fn test_zero_budget_is_degenerate_not_error() {
        let mut optimizer = GeneticOptimizer::with_seed(small_config(), 6);
        let result = optimizer
            .optimize_budget_allocation(&two_campaigns(), 0.0, Objective::MaximizeConversions)
            .unwrap();
        assert!(result.optimized_parameters.values().all(|v| *v == 0.0));
        assert_eq!(result.optimized_parameters.len(), 2);
        assert_eq!(result.expected_improvement, 0.0);
        assert!((0.0..=1.0).contains(&result.confidence_score));
    }

    #[test]
    fn test_invalid_config_rejected_before_search() {
        let config = GeneticConfig {
            tournament_size: 11,
            ..small_config()
        };
        let mut optimizer = GeneticOptimizer::with_seed(config, 7);
        let err = optimizer
            .optimize_budget_allocation(&two_campaigns(), 100.0, Objective::MaximizeRoi)
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::Configuration(ConfigError::TournamentSize { .. })
        ));
    }

    #[test]
    fn test_registry_bounds_narrow_campaign_range() {
        let config = GeneticConfig {
            population_size: 20,
            max_generations: 30,
            ..GeneticConfig::default()
        };
        let mut optimizer = GeneticOptimizer::with_seed(config, 8);
        optimizer
            .set_constraints([("campaign_0_budget", Bounds::new(0.0, 500.0))])
            .unwrap();
        let result = optimizer
            .optimize_budget_allocation(&two_campaigns(), 2000.0, Objective::MaximizeRoi)
            .unwrap();
        assert!(result.optimized_parameters["campaign_0_budget"] <= 500.0 + 1e-9);
        assert!((spent(&result) - 2000.0).abs() < 1.0);
    }

    #[test]
    fn test_bounds_that_cannot_spend_the_budget_are_rejected() {
        let campaigns = two_campaigns();
        let cases: [(usize, &[(&str, Bounds)], f64); 3] = [
            (1, &[("campaign_0_budget", Bounds::new(0.0, 500.0))], 2000.0),
            (
                2,
                &[
                    ("campaign_0_budget", Bounds::new(0.0, 100.0)),
                    ("campaign_1_budget", Bounds::new(0.0, 100.0)),
                ],
                2000.0,
            ),
            (
                2,
                &[
                    ("campaign_0_budget", Bounds::new(600.0, 2000.0)),
                    ("campaign_1_budget", Bounds::new(600.0, 2000.0)),
                ],
                1000.0,
            ),
        ];
        for (count, constraints, total_budget) in cases {
            let mut optimizer = GeneticOptimizer::with_seed(small_config(), 11);
            optimizer
                .set_constraints(constraints.iter().copied())
                .unwrap();
            let err = optimizer
                .optimize_budget_allocation(&campaigns[..count], total_budget, Objective::MaximizeRoi)
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    OptimizeError::InvalidInput(InvalidInputError::InfeasibleBounds { .. })
                ),
                "{constraints:?}: {err}"
            );
        }
    }

    #[test]
    fn test_tight_but_feasible_bounds_spend_the_budget() {
        let mut optimizer = GeneticOptimizer::with_seed(small_config(), 12);
        optimizer
            .set_constraints([
                ("campaign_0_budget", Bounds::new(0.0, 1000.0)),
                ("campaign_1_budget", Bounds::new(0.0, 1000.0)),
            ])
            .unwrap();
        let result = optimizer
            .optimize_budget_allocation(&two_campaigns(), 2000.0, Objective::MaximizeRoi)
            .unwrap();
        for value in result.optimized_parameters.values() {
            assert!((value - 1000.0).abs() < 1e-6);
        }

        let mut optimizer = GeneticOptimizer::with_seed(small_config(), 13);
        optimizer
            .set_constraints([("campaign_0_budget", Bounds::new(0.0, 5000.0))])
            .unwrap();
        let result = optimizer
            .optimize_budget_allocation(&two_campaigns()[..1], 2000.0, Objective::MaximizeRoi)
            .unwrap();
        assert_eq!(
            result.optimized_parameters,
            BTreeMap::from([("campaign_0_budget".to_owned(), 2000.0)])
        );
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = |seed| {
            GeneticOptimizer::with_seed(small_config(), seed)
                .optimize_budget_allocation(&two_campaigns(), 2000.0, Objective::Combined)
                .unwrap()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_stagnation_stops_early() {
        let config = GeneticConfig {
            population_size: 6,
            max_generations: 100,
            max_stagnant_generations: 3,
            convergence_threshold: 0.0,
            ..GeneticConfig::default()
        };
        let mut optimizer = GeneticOptimizer::with_seed(config, 10);
        let result = optimizer
            .optimize_budget_allocation(&two_campaigns()[..1], 100.0, Objective::MaximizeRoi)
            .unwrap();
        assert_eq!(
            result.metadata.convergence_reason,
            ConvergenceReason::Stagnated
        );
        assert_eq!(result.iterations_used, 3);
    }
}
