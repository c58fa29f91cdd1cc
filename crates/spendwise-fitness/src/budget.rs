//! Budget allocation across campaigns.
//!
//! Genes are the per-campaign budgets `campaign_{i}_budget`, each bounded to
//! `[0, total_budget]`. Every candidate must spend the whole budget, which bounds
//! cannot express, so [`BudgetAllocationFitness::repair`] runs
//! [`renormalize_to_total`] after every genetic operation.
//!
//! # Fitness
//!
//! ```text
//! score(metric) = Σ(budget_i × metric_i) / (total_budget × max_i |metric_i|)
//! fitness       = w_roi × score(roi) + w_conv × score(conversion_rate) + w_ctr × score(ctr)
//! ```
//!
//! Each score is the yield of the split relative to putting the whole budget on the
//! best campaign for that metric, so it lies in `[-1, 1]` regardless of budget size.
//! The weights come from [`Objective::weights`]: a single objective uses one metric,
//! `combined` uses `0.5 / 0.3 / 0.2`.

use spendwise_core::{Bounds, CampaignSlot, CampaignStats, Genes, Objective, ParameterBounds};

use crate::FitnessEvaluator;

/// Budget residual considered spent, relative to the total.
const REPAIR_TOLERANCE: f64 = 1e-9;

/// Scores budget splits against historical campaign performance.
#[derive(Debug, Clone)]
pub struct BudgetAllocationFitness {
    campaigns: Vec<CampaignStats>,
    total_budget: f64,
    objective: Objective,
    /// Per-metric normalizers `max_i |metric_i|` for roi, conversion rate, ctr.
    metric_scales: [f64; 3],
}

impl BudgetAllocationFitness {
    #[must_use]
    pub fn new(campaigns: Vec<CampaignStats>, total_budget: f64, objective: Objective) -> Self {
        let scale = |metric: fn(&CampaignStats) -> f64| {
            campaigns
                .iter()
                .map(|c| metric(c).abs())
                .filter(|m| m.is_finite())
                .fold(0.0, f64::max)
        };
        let metric_scales = [
            scale(|c| c.roi),
            scale(|c| c.conversion_rate),
            scale(|c| c.ctr),
        ];
        Self {
            campaigns,
            total_budget,
            objective,
            metric_scales,
        }
    }

    #[must_use]
    pub fn campaigns(&self) -> &[CampaignStats] {
        &self.campaigns
    }

    #[must_use]
    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Gene keys, one per campaign, in campaign order.
    pub fn slots(&self) -> impl Iterator<Item = CampaignSlot> + use<> {
        (0..self.campaigns.len()).map(CampaignSlot)
    }

    /// Even split of the total budget.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn even_split(&self) -> Genes<CampaignSlot> {
        let share = if self.campaigns.is_empty() {
            0.0
        } else {
            self.total_budget / self.campaigns.len() as f64
        };
        self.slots().map(|slot| (slot, share)).collect()
    }

    /// Every campaign may receive anything from nothing to the whole budget.
    #[must_use]
    pub fn default_bounds(&self) -> ParameterBounds<CampaignSlot> {
        let bounds = Bounds::new(0.0, self.total_budget);
        self.slots().map(|slot| (slot, bounds)).collect()
    }

    fn metric_score(&self, genes: &Genes<CampaignSlot>, index: usize) -> f64 {
        let scale = self.metric_scales[index];
        if scale <= 0.0 || self.total_budget <= 0.0 {
            return 0.0;
        }
        let yield_sum = self
            .campaigns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let metric = [c.roi, c.conversion_rate, c.ctr][index];
                let budget = genes.get(&CampaignSlot(i)).copied().unwrap_or(0.0);
                if metric.is_finite() {
                    budget * metric
                } else {
                    0.0
                }
            })
            .sum::<f64>();
        yield_sum / (self.total_budget * scale)
    }
}

impl FitnessEvaluator for BudgetAllocationFitness {
    type Key = CampaignSlot;

    fn evaluate(&self, genes: &Genes<CampaignSlot>) -> f64 {
        let (w_roi, w_conversions, w_clicks) = self.objective.weights();
        [w_roi, w_conversions, w_clicks]
            .into_iter()
            .enumerate()
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(index, weight)| weight * self.metric_score(genes, index))
            .sum()
    }

    fn repair(&self, genes: &mut Genes<CampaignSlot>, bounds: &ParameterBounds<CampaignSlot>) {
        renormalize_to_total(genes, bounds, self.total_budget);
    }
}

/// Rescales genes so that they sum to `total` while staying inside their bounds.
///
/// 1. Every gene is clipped into its bounds (genes without a bound use `[0, total]`)
/// 2. The residual `total - Σ genes` is spread over the genes that can still move in
///    its direction, proportionally to their current value (evenly if they are all
///    zero)
/// 3. Step 2 repeats until the residual vanishes or no gene can absorb more
///
/// A single gene is set to `total` directly, so a one-campaign split is exact. If the
/// bounds cannot accommodate `total` at all, genes end up pinned at the nearest
/// feasible extreme.
///
/// # Examples
///
/// ```
/// use spendwise_core::{Bounds, CampaignSlot, Genes, ParameterBounds};
/// use spendwise_fitness::budget::renormalize_to_total;
///
/// let bounds: ParameterBounds<_> = (0..2)
///     .map(|i| (CampaignSlot(i), Bounds::new(0.0, 100.0)))
///     .collect();
/// let mut genes: Genes<_> = [(CampaignSlot(0), 30.0), (CampaignSlot(1), 10.0)].into();
/// renormalize_to_total(&mut genes, &bounds, 100.0);
/// assert!((genes[&CampaignSlot(0)] - 75.0).abs() < 1e-9);
/// assert!((genes[&CampaignSlot(1)] - 25.0).abs() < 1e-9);
/// ```
pub fn renormalize_to_total<K>(genes: &mut Genes<K>, bounds: &ParameterBounds<K>, total: f64)
where
    K: Ord,
{
    let fallback = Bounds::new(0.0, total);
    let bound_of = |key: &K| bounds.get(key).copied().unwrap_or(fallback);

    if genes.len() == 1 {
        if let Some((key, value)) = genes.iter_mut().next() {
            *value = bound_of(key).clamp(total);
        }
        return;
    }

    for (key, value) in genes.iter_mut() {
        *value = bound_of(key).clamp(*value);
    }

    let tolerance = REPAIR_TOLERANCE * total.abs().max(1.0);
    for _ in 0..=genes.len() {
        let residual = total - genes.values().sum::<f64>();
        if residual.abs() <= tolerance {
            break;
        }

        let movable = genes
            .iter_mut()
            .filter(|(key, value)| {
                let bounds = bound_of(*key);
                if residual > 0.0 {
                    **value < bounds.max
                } else {
                    **value > bounds.min
                }
            })
            .collect::<Vec<_>>();
        if movable.is_empty() {
            break;
        }

        let weight_sum = movable.iter().map(|(_, value)| value.abs()).sum::<f64>();
        #[expect(clippy::cast_precision_loss)]
        let count = movable.len() as f64;
        for (key, value) in movable {
            let share = if weight_sum > f64::EPSILON {
                value.abs() / weight_sum
            } else {
                1.0 / count
            };
            *value = bound_of(key).clamp(*value + residual * share);
        }
    }
}

#[cfg(test)]
mod tests {
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

    fn sum(genes: &Genes<CampaignSlot>) -> f64 {
        genes.values().sum()
    }

    #[test]
    fn test_even_split_and_bounds() {
        let fitness = BudgetAllocationFitness::new(two_campaigns(), 2000.0, Objective::MaximizeRoi);
        let template = fitness.even_split();
        assert_eq!(template[&CampaignSlot(0)], 1000.0);
        assert_eq!(template[&CampaignSlot(1)], 1000.0);
        let bounds = fitness.default_bounds();
        assert_eq!(bounds[&CampaignSlot(1)], Bounds::new(0.0, 2000.0));
    }

    #[test]
    fn test_roi_prefers_best_campaign() {
        let fitness = BudgetAllocationFitness::new(two_campaigns(), 2000.0, Objective::MaximizeRoi);
        let all_on_best: Genes<_> = [(CampaignSlot(0), 2000.0), (CampaignSlot(1), 0.0)].into();
        let even = fitness.even_split();
        assert!((fitness.evaluate(&all_on_best) - 1.0).abs() < 1e-12);
        let expected_even = (1000.0 * 2.5 + 1000.0 * 1.8) / (2000.0 * 2.5);
        assert!((fitness.evaluate(&even) - expected_even).abs() < 1e-12);
    }

    #[test]
    fn test_combined_blends_all_metrics() {
        let fitness = BudgetAllocationFitness::new(two_campaigns(), 2000.0, Objective::Combined);
        let all_on_second: Genes<_> = [(CampaignSlot(0), 0.0), (CampaignSlot(1), 2000.0)].into();
        let expected = 0.5 * (1.8 / 2.5) + 0.3 * (0.02 / 0.03) + 0.2 * (0.008 / 0.01);
        assert!((fitness.evaluate(&all_on_second) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_fitness_scale_is_budget_independent() {
        let small = BudgetAllocationFitness::new(two_campaigns(), 10.0, Objective::MaximizeClicks);
        let large =
            BudgetAllocationFitness::new(two_campaigns(), 10_000.0, Objective::MaximizeClicks);
        let diff = small.evaluate(&small.even_split()) - large.evaluate(&large.even_split());
        assert!(diff.abs() < 1e-12);
    }

    #[test]
    fn test_zero_budget_scores_zero() {
        let fitness = BudgetAllocationFitness::new(two_campaigns(), 0.0, Objective::Combined);
        let template = fitness.even_split();
        assert!(template.values().all(|v| *v == 0.0));
        assert_eq!(fitness.evaluate(&template), 0.0);
    }

    #[test]
    fn test_renormalize_scales_proportionally() {
        let fitness = BudgetAllocationFitness::new(two_campaigns(), 2000.0, Objective::MaximizeRoi);
        let bounds = fitness.default_bounds();
        let mut genes: Genes<_> = [(CampaignSlot(0), 1500.0), (CampaignSlot(1), 1500.0)].into();
        fitness.repair(&mut genes, &bounds);
        assert!((sum(&genes) - 2000.0).abs() < 1e-6);
        assert!((genes[&CampaignSlot(0)] - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_renormalize_all_zero_splits_evenly() {
        let bounds: ParameterBounds<_> = (0..4)
            .map(|i| (CampaignSlot(i), Bounds::new(0.0, 400.0)))
            .collect();
        let mut genes: Genes<_> = (0..4).map(|i| (CampaignSlot(i), 0.0)).collect();
        renormalize_to_total(&mut genes, &bounds, 400.0);
        for value in genes.values() {
            assert!((value - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_renormalize_respects_tight_bounds() {
        let bounds: ParameterBounds<_> = [
            (CampaignSlot(0), Bounds::new(0.0, 100.0)),
            (CampaignSlot(1), Bounds::new(0.0, 1000.0)),
            (CampaignSlot(2), Bounds::new(0.0, 1000.0)),
        ]
        .into();
        let mut genes: Genes<_> = [
            (CampaignSlot(0), 900.0),
            (CampaignSlot(1), 50.0),
            (CampaignSlot(2), 50.0),
        ]
        .into();
        renormalize_to_total(&mut genes, &bounds, 1000.0);
        assert!((sum(&genes) - 1000.0).abs() < 1e-6);
        assert!(genes[&CampaignSlot(0)] <= 100.0);
        for (slot, value) in &genes {
            assert!(bounds[slot].contains(*value), "{slot} = {value}");
        }
    }

    #[test]
    fn test_renormalize_single_gene_is_exact() {
        let bounds: ParameterBounds<_> = [(CampaignSlot(0), Bounds::new(0.0, 1234.5))].into();
        let mut genes: Genes<_> = [(CampaignSlot(0), 17.3)].into();
        renormalize_to_total(&mut genes, &bounds, 1234.5);
        assert_eq!(genes[&CampaignSlot(0)], 1234.5);
    }

    #[test]
    fn test_renormalize_clips_negative_values() {
        let bounds: ParameterBounds<_> = (0..2)
            .map(|i| (CampaignSlot(i), Bounds::new(0.0, 10.0)))
            .collect();
        let mut genes: Genes<_> = [(CampaignSlot(0), -5.0), (CampaignSlot(1), 5.0)].into();
        renormalize_to_total(&mut genes, &bounds, 10.0);
        assert_eq!(genes[&CampaignSlot(0)], 0.0);
        assert!((genes[&CampaignSlot(1)] - 10.0).abs() < 1e-9);
    }
}
