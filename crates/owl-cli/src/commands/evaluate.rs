//! Greedy evaluation of a saved table

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use owl_rl::{persistence, trainer, Environment, RewardMode};

use super::{build_world, load_config};

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Saved value table
    #[arg(default_value = "stage1_qtable.json")]
    pub table: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Steps in the evaluation episode (defaults to training.max_steps)
    #[arg(long)]
    pub steps: Option<usize>,

    /// Reward mode used to score the episode
    #[arg(long)]
    pub reward_mode: Option<RewardMode>,

    /// World layout file
    #[arg(long)]
    pub world: Option<PathBuf>,
}

pub fn run(args: &EvaluateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.reward_mode {
        config.environment.reward_mode = mode;
    }
    let layout = args.world.as_deref().or(config.world.layout.as_deref());
    let max_steps = args.steps.unwrap_or(config.training.max_steps);

    let mut table = persistence::load(&args.table)
        .with_context(|| format!("Failed to load value table {}", args.table.display()))?;
    let mut env = Environment::new(build_world(layout)?, config.environment);

    let summary = trainer::evaluate(&mut env, &mut table, max_steps)?;

    println!("Evaluation");
    println!("==========");
    println!("Steps:          {}", summary.steps);
    println!("Total reward:   {:.2}", summary.total_reward);
    println!(
        "Unique tiles:   {} of {} ({})",
        summary.distinct_tiles,
        env.world().floor_tiles(),
        env.config().reward_mode
    );
    println!("Maps visited:   {}", summary.maps_visited);
    println!("Start state:    {}", summary.start_state);
    println!("Final state:    {}", summary.final_state);

    Ok(())
}
