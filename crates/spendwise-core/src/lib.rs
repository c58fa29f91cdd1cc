//! Domain vocabulary for the Spendwise budget and campaign optimizer.
//!
//! This crate defines the data the optimizer searches over and the data it is
//! scored against, without any of the search machinery:
//!
//! - [`Bounds`] / [`ParameterBounds`] - permissible range of each numeric parameter
//! - [`Genes`] / [`GeneKey`] - named numeric values making up one candidate solution
//! - [`CampaignSlot`] - variable-arity gene keys for budget allocation
//!   (`campaign_0_budget`, `campaign_1_budget`, ...)
//! - [`TuningParam`] - closed set of gene keys for campaign control tuning
//! - [`CampaignStats`], [`PerformanceObservation`], [`Objective`] - historical inputs
//!   and the scoring strategy selected by the caller

pub use self::{bounds::*, campaign::*, gene::*};

pub mod bounds;
pub mod campaign;
pub mod gene;
