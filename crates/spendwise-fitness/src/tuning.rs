//! Campaign control parameter tuning from recent performance.
//!
//! **This is a heuristic proxy, not a simulator.** There is no model of how an ad
//! platform responds to a bid or radius change. Instead, the recent performance
//! history is condensed into a few signals, and each parameter gets a *target
//! position* inside its bound interval that the signals argue for. Fitness rewards
//! candidates close to those targets.
//!
//! # Signals
//!
//! Observations are weighted by recency (`0.85^age`, newest has age 0):
//!
//! ```text
//! roi_signal        = tanh(weighted_roi - 1.0)                   // above break-even?
//! conversion_signal = tanh((weighted_conversion - 0.02) / 0.02)  // converts well?
//! trend_signal      = tanh(recent_roi - weighted_roi)            // getting better?
//! ```
//!
//! where `recent_roi` uses a sharper `0.5^age` decay.
//!
//! # Targets
//!
//! | Parameter         | Blend                                  |
//! |-------------------|----------------------------------------|
//! | `max_cpc`         | `0.6 × conversion + 0.4 × roi`         |
//! | `location_radius` | `0.7 × roi + 0.3 × trend`              |
//! | `daily_budget`    | `0.5 × roi + 0.5 × trend`              |
//!
//! `target = 0.5 + 0.5 × blend`, a position in `[0, 1]` of the parameter's range:
//! strong, improving performance pushes spend-related parameters toward their upper
//! bound, weak performance toward the lower bound. An empty history yields neutral
//! targets at mid-range.
//!
//! # Fitness
//!
//! ```text
//! fitness = 1 - mean_p (position(value_p) - target_p)²
//! ```

use std::collections::BTreeMap;

use spendwise_core::{Genes, ParameterBounds, PerformanceObservation, TuningParam};

use crate::FitnessEvaluator;

const RECENCY_DECAY: f64 = 0.85;
const RECENT_DECAY: f64 = 0.5;
const ROI_BREAK_EVEN: f64 = 1.0;
const CONVERSION_REFERENCE: f64 = 0.02;

/// Condensed reading of a performance history, each signal in `[-1, 1]`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PerformanceSignals {
    pub roi: f64,
    pub conversion: f64,
    pub trend: f64,
}

impl PerformanceSignals {
    /// Computes signals from a history ordered oldest first.
    ///
    /// Observations with non-finite values are ignored.
    #[must_use]
    pub fn from_history(history: &[PerformanceObservation]) -> Self {
        let observations = history
            .iter()
            .filter(|o| o.roi.is_finite() && o.conversion_rate.is_finite())
            .collect::<Vec<_>>();
        let Some(weighted_roi) = recency_mean(&observations, RECENCY_DECAY, |o| o.roi) else {
            return Self::default();
        };
        let weighted_conversion =
            recency_mean(&observations, RECENCY_DECAY, |o| o.conversion_rate).unwrap_or(0.0);
        let recent_roi = recency_mean(&observations, RECENT_DECAY, |o| o.roi).unwrap_or(0.0);

        Self {
            roi: (weighted_roi - ROI_BREAK_EVEN).tanh(),
            conversion: ((weighted_conversion - CONVERSION_REFERENCE) / CONVERSION_REFERENCE)
                .tanh(),
            trend: (recent_roi - weighted_roi).tanh(),
        }
    }

    /// Target position in `[0, 1]` for a parameter inside its range.
    #[must_use]
    pub fn target_position(&self, param: TuningParam) -> f64 {
        let blend = match param {
            TuningParam::MaxCpc => 0.6 * self.conversion + 0.4 * self.roi,
            TuningParam::LocationRadius => 0.7 * self.roi + 0.3 * self.trend,
            TuningParam::DailyBudget => 0.5 * self.roi + 0.5 * self.trend,
        };
        (0.5 + 0.5 * blend).clamp(0.0, 1.0)
    }
}

/// Weighted mean with weight `decay^age`, newest observation last.
fn recency_mean<F>(observations: &[&PerformanceObservation], decay: f64, value: F) -> Option<f64>
where
    F: Fn(&PerformanceObservation) -> f64,
{
    let mut weight = 1.0;
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for observation in observations.iter().rev() {
        weighted_sum += weight * value(*observation);
        weight_sum += weight;
        weight *= decay;
    }
    (weight_sum > 0.0).then(|| weighted_sum / weight_sum)
}

/// Scores campaign control parameters against recent performance.
#[derive(Debug, Clone)]
pub struct ParameterTuningFitness {
    signals: PerformanceSignals,
    bounds: ParameterBounds<TuningParam>,
    targets: BTreeMap<TuningParam, f64>,
}

impl ParameterTuningFitness {
    /// Builds the evaluator for a history (oldest first) and the effective bounds of
    /// each tuned parameter.
    #[must_use]
    pub fn new(
        history: &[PerformanceObservation],
        bounds: ParameterBounds<TuningParam>,
    ) -> Self {
        let signals = PerformanceSignals::from_history(history);
        let targets = TuningParam::ALL
            .into_iter()
            .map(|param| (param, signals.target_position(param)))
            .collect();
        Self {
            signals,
            bounds,
            targets,
        }
    }

    #[must_use]
    pub fn signals(&self) -> PerformanceSignals {
        self.signals
    }

    /// Parameter values the heuristic considers ideal, within the effective bounds.
    #[must_use]
    pub fn target_values(&self) -> Genes<TuningParam> {
        self.bounds
            .iter()
            .map(|(param, bounds)| (*param, bounds.at_position(self.targets[param])))
            .collect()
    }
}

impl FitnessEvaluator for ParameterTuningFitness {
    type Key = TuningParam;

    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, genes: &Genes<TuningParam>) -> f64 {
        if genes.is_empty() {
            return 0.0;
        }
        let squared_distance = genes
            .iter()
            .map(|(param, value)| {
                let bounds = self
                    .bounds
                    .get(param)
                    .copied()
                    .unwrap_or_else(|| param.default_bounds());
                (bounds.position(*value) - self.targets[param]).powi(2)
            })
            .sum::<f64>();
        1.0 - squared_distance / genes.len() as f64
    }
}
