use std::path::PathBuf;

use spendwise_core::Objective;
use tracing::info;

use crate::{
    command::OptimizerArg,
    schema::report::OptimizationReport,
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AllocateBudgetArg {
    /// JSON array of `{roi, conversion_rate, ctr}` per campaign
    #[arg(long)]
    pub(crate) campaigns: PathBuf,
    /// Budget to split across the campaigns
    #[arg(long)]
    pub(crate) total_budget: f64,
    /// maximize_roi, maximize_conversions, maximize_clicks or combined
    #[arg(long, default_value_t = Objective::MaximizeRoi)]
    pub(crate) objective: Objective,
    #[clap(flatten)]
    pub(crate) optimizer: OptimizerArg,
    /// Output file path
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run(arg: &AllocateBudgetArg) -> anyhow::Result<()> {
    let AllocateBudgetArg {
        campaigns,
        total_budget,
        objective,
        optimizer,
        output,
    } = arg;
    let campaigns = util::read_campaigns_file(campaigns)?;
    info!(
        campaigns = campaigns.len(),
        total_budget, %objective, "allocating budget"
    );

    let mut genetic = optimizer.build()?;
    let result = genetic.optimize_budget_allocation(&campaigns, *total_budget, *objective)?;
    let report = OptimizationReport::new(genetic.config().clone(), optimizer.seed(), result);
    util::save_json(&report, output.as_deref())?;
    Ok(())
}
