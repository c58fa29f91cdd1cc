use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendwise_optimizer::{GeneticConfig, OptimizationResult};

/// Envelope written by the optimization commands.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizationReport {
    pub generated_at: DateTime<Utc>,
    /// Seed of the random source, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Configuration the run actually used.
    pub config: GeneticConfig,
    pub result: OptimizationResult,
}

impl OptimizationReport {
    pub fn new(config: GeneticConfig, seed: Option<u64>, result: OptimizationResult) -> Self {
        Self {
            generated_at: Utc::now(),
            seed,
            config,
            result,
        }
    }
}
