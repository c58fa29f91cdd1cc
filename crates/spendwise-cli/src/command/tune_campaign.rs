use std::path::PathBuf;

use tracing::info;

use crate::{
    command::OptimizerArg,
    schema::report::OptimizationReport,
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TuneCampaignArg {
    /// JSON object `{current_params, performance_history}`
    #[arg(long)]
    input: PathBuf,
    #[clap(flatten)]
    optimizer: OptimizerArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TuneCampaignArg) -> anyhow::Result<()> {
    let TuneCampaignArg {
        input,
        optimizer,
        output,
    } = arg;
    let input = util::read_tuning_file(input)?;
    info!(
        parameters = input.current_params.len(),
        observations = input.performance_history.len(),
        "tuning campaign parameters"
    );

    let mut genetic = optimizer.build()?;
    let result =
        genetic.optimize_campaign_parameters(&input.current_params, &input.performance_history)?;
    let report = OptimizationReport::new(genetic.config().clone(), optimizer.seed(), result);
    util::save_json(&report, output.as_deref())?;
    Ok(())
}
