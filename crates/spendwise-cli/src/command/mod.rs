use std::{io, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use spendwise_optimizer::{GeneticConfig, GeneticOptimizer};
use tracing::Level;

use crate::util;

use self::{
    allocate_budget::AllocateBudgetArg, status::StatusArg, tune_campaign::TuneCampaignArg,
};

mod allocate_budget;
mod status;
mod tune_campaign;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Split a total budget across campaigns
    AllocateBudget(#[clap(flatten)] AllocateBudgetArg),
    /// Tune campaign control parameters from recent performance
    TuneCampaign(#[clap(flatten)] TuneCampaignArg),
    /// Show the effective optimizer settings
    Status(#[clap(flatten)] StatusArg),
}

/// Genetic algorithm settings shared by every command.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct OptimizerArg {
    /// JSON file with a (possibly partial) genetic algorithm configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `population_size`
    #[arg(long)]
    population_size: Option<usize>,
    /// Overrides `max_generations`
    #[arg(long)]
    max_generations: Option<usize>,
    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file mapping parameter names to `{min, max}` bounds
    #[arg(long)]
    bounds: Option<PathBuf>,
    /// JSON file mapping parameter names to `{min, max}` constraints
    #[arg(long)]
    constraints: Option<PathBuf>,
}

impl OptimizerArg {
    fn load_config(&self) -> anyhow::Result<GeneticConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file::<GeneticConfig, _>("config", path)?,
            None => GeneticConfig::default(),
        };
        if let Some(population_size) = self.population_size {
            config.population_size = population_size;
        }
        if let Some(max_generations) = self.max_generations {
            config.max_generations = max_generations;
        }
        Ok(config)
    }

    /// Builds a configured optimizer with its bounds registry filled in.
    pub(crate) fn build(&self) -> anyhow::Result<GeneticOptimizer> {
        let config = self.load_config()?;
        let mut optimizer = match self.seed {
            Some(seed) => GeneticOptimizer::with_seed(GeneticConfig::default(), seed),
            None => GeneticOptimizer::default(),
        };
        optimizer
            .configure(config)
            .context("Invalid genetic algorithm configuration")?;
        if let Some(path) = &self.bounds {
            optimizer
                .set_parameter_bounds(util::read_bounds_file("bounds", path)?)
                .with_context(|| format!("Invalid bounds in {}", path.display()))?;
        }
        if let Some(path) = &self.constraints {
            optimizer
                .set_constraints(util::read_bounds_file("constraints", path)?)
                .with_context(|| format!("Invalid constraints in {}", path.display()))?;
        }
        Ok(optimizer)
    }

    pub(crate) fn seed(&self) -> Option<u64> {
        self.seed
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.verbose);
    match args.mode {
        Mode::AllocateBudget(arg) => allocate_budget::run(&arg)?,
        Mode::TuneCampaign(arg) => tune_campaign::run(&arg)?,
        Mode::Status(arg) => status::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use spendwise_core::Objective;

    use super::*;

    #[test]
    fn test_parses_allocate_budget() {
        let args = CommandArgs::try_parse_from([
            "spendwise",
            "-vv",
            "allocate-budget",
            "--campaigns",
            "campaigns.json",
            "--total-budget",
            "2000",
            "--objective",
            "combined",
            "--population-size",
            "20",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        let Mode::AllocateBudget(arg) = args.mode else {
            panic!("expected allocate-budget");
        };
        assert_eq!(arg.objective, Objective::Combined);
        assert_eq!(arg.total_budget, 2000.0);
        assert_eq!(arg.optimizer.population_size, Some(20));
        assert_eq!(arg.optimizer.seed(), Some(7));
    }

    #[test]
    fn test_rejects_unknown_objective() {
        let result = CommandArgs::try_parse_from([
            "spendwise",
            "allocate-budget",
            "--campaigns",
            "campaigns.json",
            "--total-budget",
            "10",
            "--objective",
            "maximize_reach",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_overrides_and_invalid_config() {
        let arg = OptimizerArg {
            population_size: Some(12),
            max_generations: Some(3),
            ..OptimizerArg::default()
        };
        let config = arg.load_config().unwrap();
        assert_eq!(config.population_size, 12);
        assert_eq!(config.max_generations, 3);
        assert_eq!(config.mutation_rate, GeneticConfig::default().mutation_rate);

        let arg = OptimizerArg {
            population_size: Some(0),
            ..OptimizerArg::default()
        };
        assert!(arg.build().is_err());
    }
}
