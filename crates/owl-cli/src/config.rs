//! Configuration loading for the OWL CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use owl_rl::{EnvironmentConfig, QLearningParams, TrainerConfig};

/// Configuration for training runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub training: TrainerConfig,
    pub learning: QLearningParams,
    pub environment: EnvironmentConfig,
    pub world: WorldConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// TOML layout for the grid world; the built-in demo is used when unset
    pub layout: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub table_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from("stage1_qtable.json"),
            report_path: None,
        }
    }
}

/// Template written by `owl config init`
pub const DEFAULT_CONFIG: &str = r#"[training]
num_episodes = 100
max_steps = 50

[learning]
learning_rate = 0.1
discount_factor = 0.9
epsilon = 0.3
epsilon_decay = 1.0
min_epsilon = 0.0
# seed = 42

[environment]
# "visited-set" or "last-position"
reward_mode = "visited-set"

[environment.rewards]
new_tile = 1.0
revisit_penalty = 0.05
new_map_bonus = 3.0

[environment.timing]
hold_ticks = 5
settle_ticks = 20

[world]
# layout = "world.toml"

[output]
table_path = "stage1_qtable.json"
# report_path = "report.json"
"#;

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file();

        if let Some(path) = &config_path {
            tracing::info!("Loading config from: {:?}", path);
        } else {
            tracing::debug!("No config file found, using defaults");
        }

        Self::load_from(config_path.as_deref())
    }

    /// Load from an explicit file (if any), then apply `OWL__` environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::build(path, true)
    }

    /// Load from a file alone, ignoring the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::build(Some(path), false)
    }

    fn build(path: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        // Environment variables with OWL_ prefix, e.g. OWL__LEARNING__EPSILON=0.1
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix("OWL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config = builder.build().context("Failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.learning.validate()?;
        Ok(config)
    }

    /// Find the configuration file
    pub fn find_config_file() -> Option<PathBuf> {
        // Check in order: OWL_CONFIG env, ./owl.toml, ~/.config/owl/owl.toml
        if let Ok(path) = std::env::var("OWL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("owl.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("owl").join("owl.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }
}
