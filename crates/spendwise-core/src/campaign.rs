use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Historical performance of one campaign, used to score budget splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CampaignStats {
    /// Return on ad spend (revenue per unit of spend).
    pub roi: f64,
    /// Conversions per click.
    pub conversion_rate: f64,
    /// Clicks per impression.
    pub ctr: f64,
}

/// One entry of a campaign's recent performance history, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceObservation {
    pub roi: f64,
    pub conversion_rate: f64,
}

/// Scoring strategy for budget allocation.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    #[display("maximize_roi")]
    MaximizeRoi,
    #[display("maximize_conversions")]
    MaximizeConversions,
    #[display("maximize_clicks")]
    MaximizeClicks,
    /// Weighted blend of the three single objectives.
    #[display("combined")]
    Combined,
}

impl Objective {
    pub const ALL: [Objective; 4] = [
        Objective::MaximizeRoi,
        Objective::MaximizeConversions,
        Objective::MaximizeClicks,
        Objective::Combined,
    ];

    /// Weights `(roi, conversions, clicks)` applied to the normalized metric scores.
    #[must_use]
    pub const fn weights(self) -> (f64, f64, f64) {
        match self {
            Objective::MaximizeRoi => (1.0, 0.0, 0.0),
            Objective::MaximizeConversions => (0.0, 1.0, 0.0),
            Objective::MaximizeClicks => (0.0, 0.0, 1.0),
            Objective::Combined => (0.5, 0.3, 0.2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown objective: {name} (expected maximize_roi, maximize_conversions, maximize_clicks or combined)")]
pub struct ParseObjectiveError {
    name: String,
}

impl FromStr for Objective {
    type Err = ParseObjectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|objective| objective.to_string() == s)
            .ok_or_else(|| ParseObjectiveError { name: s.to_owned() })
    }
}
