//! Trainer - drives episodes and accumulates learning in a shared table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use owl_core::{Result, State, World};

use crate::algorithm::{QLearning, TabularAlgorithm};
use crate::env::Environment;
use crate::table::ValueTable;

/// Episode budget for a training run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of independent episodes
    #[serde(default = "default_num_episodes")]
    pub num_episodes: usize,

    /// Steps taken in every episode
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_num_episodes() -> usize {
    100
}
fn default_max_steps() -> usize {
    50
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_episodes: default_num_episodes(),
            max_steps: default_max_steps(),
        }
    }
}

/// Per-episode statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f64,
    /// Size of the episode's visited set when it ended
    pub distinct_tiles: usize,
    pub maps_visited: usize,
    /// States in the value table when the episode ended
    pub table_size: usize,
    pub start_state: State,
    pub final_state: State,
}

/// Outcome of a full training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: Uuid,
    pub algorithm: String,
    pub params: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub episodes: Vec<EpisodeSummary>,
    pub total_steps: u64,
    pub table_size: usize,
}

impl TrainingReport {
    /// Distinct tiles visited in the last episode
    pub fn final_distinct_tiles(&self) -> usize {
        self.episodes.last().map_or(0, |e| e.distinct_tiles)
    }

    /// Mean total reward per episode
    pub fn mean_reward(&self) -> f64 {
        if self.episodes.is_empty() {
            0.0
        } else {
            self.episodes.iter().map(|e| e.total_reward).sum::<f64>() / self.episodes.len() as f64
        }
    }

    /// Episode with the largest visited set
    pub fn best_episode(&self) -> Option<&EpisodeSummary> {
        self.episodes.iter().max_by_key(|e| e.distinct_tiles)
    }
}

/// Runs episodes against an environment, mutating one value table throughout
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train for `num_episodes` episodes of exactly `max_steps` steps each.
    ///
    /// Visitation bookkeeping is reset at the start of every episode; the table
    /// is shared by all of them.
    pub fn run<W, A>(
        &self,
        env: &mut Environment<W>,
        algorithm: &mut A,
        table: &mut ValueTable,
    ) -> Result<TrainingReport>
    where
        W: World,
        A: TabularAlgorithm + ?Sized,
    {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Training run {} started: {} episodes x {} steps, algorithm: {}, table size: {}",
            run_id,
            self.config.num_episodes,
            self.config.max_steps,
            algorithm.name(),
            table.len()
        );

        let mut episodes = Vec::new();
        for episode in 1..=self.config.num_episodes {
            let summary = self.run_episode(episode, env, algorithm, table)?;
            algorithm.end_episode();

            info!(
                "Episode {}: visited {} unique tiles, {} maps, reward {:.2}",
                summary.episode, summary.distinct_tiles, summary.maps_visited, summary.total_reward
            );
            episodes.push(summary);
        }

        let report = TrainingReport {
            run_id,
            algorithm: algorithm.name().to_string(),
            params: algorithm.params(),
            started_at,
            finished_at: Utc::now(),
            total_steps: episodes.iter().map(|e| e.steps as u64).sum(),
            table_size: table.len(),
            episodes,
        };

        info!(
            "Training run {} complete: {} steps, {} states learned, mean reward {:.2}",
            report.run_id,
            report.total_steps,
            report.table_size,
            report.mean_reward()
        );

        Ok(report)
    }

    /// One episode: reset, then select / step / update `max_steps` times
    pub fn run_episode<W, A>(
        &self,
        episode: usize,
        env: &mut Environment<W>,
        algorithm: &mut A,
        table: &mut ValueTable,
    ) -> Result<EpisodeSummary>
    where
        W: World,
        A: TabularAlgorithm + ?Sized,
    {
        let start_state = env.reset()?;
        let mut state = start_state;
        let mut total_reward = 0.0;
        let mut steps = 0;

        for _ in 0..self.config.max_steps {
            let action = algorithm.select_action(table, state);
            let step = env.step(action)?;
            let td_error = algorithm.update(table, state, action, step.reward, step.state);
            debug!("Episode {} step {}: td error {:.4}", episode, steps, td_error);

            total_reward += step.reward;
            steps += 1;
            state = step.state;

            if step.done {
                break;
            }
        }

        Ok(EpisodeSummary {
            episode,
            steps,
            total_reward,
            distinct_tiles: env.visited_count(),
            maps_visited: env.maps_visited_count(),
            table_size: table.len(),
            start_state,
            final_state: state,
        })
    }
}

/// Greedy rollout of a learned table without updating any value.
///
/// Unseen states still get a zeroed row, so the table may grow.
pub fn evaluate<W: World>(
    env: &mut Environment<W>,
    table: &mut ValueTable,
    max_steps: usize,
) -> Result<EpisodeSummary> {
    let start_state = env.reset()?;
    let mut state = start_state;
    let mut total_reward = 0.0;
    let mut steps = 0;

    for _ in 0..max_steps {
        let action = QLearning::greedy_action(table, state);
        let step = env.step(action)?;
        total_reward += step.reward;
        steps += 1;
        state = step.state;

        if step.done {
            break;
        }
    }

    info!(
        "Evaluation: visited {} unique tiles, {} maps, reward {:.2}",
        env.visited_count(),
        env.maps_visited_count(),
        total_reward
    );

    Ok(EpisodeSummary {
        episode: 1,
        steps,
        total_reward,
        distinct_tiles: env.visited_count(),
        maps_visited: env.maps_visited_count(),
        table_size: table.len(),
        start_state,
        final_state: state,
    })
}
