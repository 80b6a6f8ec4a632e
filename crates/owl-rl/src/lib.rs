//! OWL RL - Tabular Q-learning for tile exploration
//!
//! This crate turns raw player positions into reward-bearing transitions,
//! learns a state-action value table with epsilon-greedy Q-learning, and
//! persists that table between runs.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithm;
pub mod env;
pub mod persistence;
pub mod table;
pub mod trainer;

pub use algorithm::{QLearning, QLearningParams, TabularAlgorithm};
pub use env::{Environment, EnvironmentConfig, RewardConfig, RewardMode, Step};
pub use table::{ActionValues, ValueTable};
pub use trainer::{EpisodeSummary, Trainer, TrainerConfig, TrainingReport};
