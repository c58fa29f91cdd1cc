use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Named numeric values making up one candidate solution.
///
/// Keys iterate in their `Ord` order, which is the order crossover cut points
/// refer to.
pub type Genes<K> = BTreeMap<K, f64>;

/// A key naming one gene.
///
/// Implemented for [`CampaignSlot`] (variable arity, one per campaign) and
/// [`TuningParam`] (closed set). The `Display` form is the external parameter
/// name reported in results.
pub trait GeneKey: Ord + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> GeneKey for T where T: Ord + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// Budget gene of the campaign at a given index, named `campaign_{index}_budget`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("campaign_{_0}_budget")]
pub struct CampaignSlot(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("not a campaign budget parameter: {name}")]
pub struct ParseCampaignSlotError {
    name: String,
}

impl FromStr for CampaignSlot {
    type Err = ParseCampaignSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("campaign_")
            .and_then(|rest| rest.strip_suffix("_budget"))
            .and_then(|index| index.parse().ok())
            .map(CampaignSlot)
            .ok_or_else(|| ParseCampaignSlotError { name: s.to_owned() })
    }
}

/// Campaign control parameter tuned from performance history.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TuningParam {
    /// Maximum cost per click.
    #[display("max_cpc")]
    MaxCpc,
    /// Geographic targeting radius.
    #[display("location_radius")]
    LocationRadius,
    /// Daily spend cap.
    #[display("daily_budget")]
    DailyBudget,
}

impl TuningParam {
    pub const ALL: [TuningParam; 3] = [
        TuningParam::MaxCpc,
        TuningParam::LocationRadius,
        TuningParam::DailyBudget,
    ];

    /// Range used when no explicit bound or constraint names this parameter.
    #[must_use]
    pub const fn default_bounds(self) -> Bounds {
        match self {
            TuningParam::MaxCpc => Bounds { min: 0.1, max: 5.0 },
            TuningParam::LocationRadius => Bounds {
                min: 5.0,
                max: 100.0,
            },
            TuningParam::DailyBudget => Bounds {
                min: 50.0,
                max: 5000.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown tuning parameter: {name}")]
pub struct ParseTuningParamError {
    name: String,
}

impl FromStr for TuningParam {
    type Err = ParseTuningParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|param| param.to_string() == s)
            .ok_or_else(|| ParseTuningParamError { name: s.to_owned() })
    }
}
