use std::path::PathBuf;

use crate::{command::OptimizerArg, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct StatusArg {
    #[clap(flatten)]
    optimizer: OptimizerArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &StatusArg) -> anyhow::Result<()> {
    let StatusArg { optimizer, output } = arg;
    let status = optimizer.build()?.status();
    util::save_json(&status, output.as_deref())?;
    Ok(())
}
