use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spendwise_core::PerformanceObservation;

/// Input of the `tune-campaign` command.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TuningInput {
    pub current_params: BTreeMap<String, f64>,
    /// Oldest observation first.
    #[serde(default)]
    pub performance_history: Vec<PerformanceObservation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_optional() {
        let input: TuningInput =
            serde_json::from_str(r#"{"current_params": {"max_cpc": 1.5}}"#).unwrap();
        assert_eq!(input.current_params["max_cpc"], 1.5);
        assert!(input.performance_history.is_empty());
    }

    #[test]
    fn test_parses_history() {
        let input: TuningInput = serde_json::from_str(
            r#"{
                "current_params": {"daily_budget": 300, "bid_modifier": 1.1},
                "performance_history": [
                    {"roi": 1.2, "conversion_rate": 0.02},
                    {"roi": 1.8, "conversion_rate": 0.03}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(input.current_params.len(), 2);
        assert_eq!(input.performance_history[1].roi, 1.8);
    }
}
