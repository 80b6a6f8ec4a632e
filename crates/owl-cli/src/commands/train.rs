//! Training command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use owl_rl::{persistence, Environment, QLearning, RewardMode, Trainer, ValueTable};

use super::{build_world, load_config};
use crate::config::Config;

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Configuration file (defaults to OWL_CONFIG, ./owl.toml, ~/.config/owl/owl.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of episodes
    #[arg(short = 'n', long)]
    pub episodes: Option<usize>,

    /// Steps per episode
    #[arg(long)]
    pub steps: Option<usize>,

    /// Exploration rate
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Learning rate
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Random seed for action selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reward mode: visited-set or last-position
    #[arg(long)]
    pub reward_mode: Option<RewardMode>,

    /// World layout file
    #[arg(long)]
    pub world: Option<PathBuf>,

    /// Where to save the value table
    #[arg(short, long)]
    pub table: Option<PathBuf>,

    /// Continue training from the table at --table if it exists
    #[arg(long)]
    pub resume: bool,

    /// Where to write the training report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl TrainArgs {
    /// Apply command line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(episodes) = self.episodes {
            config.training.num_episodes = episodes;
        }
        if let Some(steps) = self.steps {
            config.training.max_steps = steps;
        }
        if let Some(epsilon) = self.epsilon {
            config.learning.epsilon = epsilon;
        }
        if let Some(alpha) = self.alpha {
            config.learning.learning_rate = alpha;
        }
        if let Some(gamma) = self.gamma {
            config.learning.discount_factor = gamma;
        }
        if self.seed.is_some() {
            config.learning.seed = self.seed;
        }
        if let Some(mode) = self.reward_mode {
            config.environment.reward_mode = mode;
        }
        if self.world.is_some() {
            config.world.layout.clone_from(&self.world);
        }
        if let Some(table) = &self.table {
            config.output.table_path.clone_from(table);
        }
        if self.report.is_some() {
            config.output.report_path.clone_from(&self.report);
        }
    }
}

pub fn run(args: TrainArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);

    let world = build_world(config.world.layout.as_deref())?;
    let mut env = Environment::new(world, config.environment);
    let mut algorithm = QLearning::new(config.learning.clone())?;

    let table_path = &config.output.table_path;
    let mut table = if args.resume && table_path.exists() {
        persistence::load(table_path)
            .with_context(|| format!("Failed to load value table {}", table_path.display()))?
    } else {
        if args.resume {
            warn!("No table at {:?}, starting from scratch", table_path);
        }
        ValueTable::new()
    };

    info!(
        "Reward mode: {}, world maps: {:?}, floor tiles: {}",
        env.config().reward_mode,
        env.world().map_ids(),
        env.world().floor_tiles()
    );

    let trainer = Trainer::new(config.training);
    let report = trainer.run(&mut env, &mut algorithm, &mut table)?;

    persistence::save(&table, table_path)
        .with_context(|| format!("Failed to save value table {}", table_path.display()))?;

    if let Some(path) = &config.output.report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Wrote training report to {:?}", path);
    }

    println!("Training complete");
    println!("=================");
    println!("Run:              {}", report.run_id);
    println!("Episodes:         {}", report.episodes.len());
    println!("Total steps:      {}", report.total_steps);
    println!("States learned:   {}", report.table_size);
    println!("Mean reward:      {:.2}", report.mean_reward());
    println!("Final tiles:      {}", report.final_distinct_tiles());
    if let Some(best) = report.best_episode() {
        println!(
            "Best episode:     {} ({} tiles, {} maps)",
            best.episode, best.distinct_tiles, best.maps_visited
        );
    }
    println!("Saved table to:   {}", table_path.display());

    Ok(())
}
